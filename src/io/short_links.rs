//! Short links for document references sent by SMS
//!
//! A shortener keeps a table of short id to long URL. Customers receive
//! `{base}/r/{id}` and the id is resolved back to the document link when
//! the short URL is opened.

use crate::types::RentalError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Length of a generated short id
pub const SHORT_ID_LEN: usize = 6;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_ATTEMPTS: u32 = 16;

/// Maps long document links to short URLs
pub trait LinkShortener: Send + Sync {
    /// Register `long_url` and return the short URL pointing at it
    ///
    /// # Errors
    ///
    /// `RentalError::NotificationFailed` when no short link could be stored.
    fn shorten(&self, long_url: &str) -> Result<String, RentalError>;

    /// Long URL registered under `id`, if any
    fn resolve(&self, id: &str) -> Option<String>;
}

/// Shortener backed by an in-memory link table
///
/// Ids are six base36 characters derived from the long URL, so shortening
/// the same link twice yields the same short URL. A collision with another
/// link moves on to the next candidate id.
#[derive(Debug)]
pub struct InMemoryLinkShortener {
    base_url: String,
    links: DashMap<String, String>,
}

impl InMemoryLinkShortener {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            links: DashMap::new(),
        }
    }

    /// Short URL for `id` under this shortener's base
    pub fn short_url(&self, id: &str) -> String {
        format!("{}/r/{}", self.base_url, id)
    }

    /// All registered links as (id, long URL), sorted by id
    pub fn links(&self) -> Vec<(String, String)> {
        let mut links: Vec<(String, String)> = self
            .links
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        links.sort();
        links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl LinkShortener for InMemoryLinkShortener {
    fn shorten(&self, long_url: &str) -> Result<String, RentalError> {
        let long_url = long_url.trim();
        if long_url.is_empty() {
            return Err(RentalError::notification_failed("missing document link"));
        }

        for attempt in 0..MAX_ATTEMPTS {
            let id = short_id(long_url, attempt);
            match self.links.entry(id.clone()) {
                Entry::Occupied(existing) if existing.get() == long_url => {
                    return Ok(self.short_url(&id));
                }
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(long_url.to_string());
                    return Ok(self.short_url(&id));
                }
            }
        }

        Err(RentalError::notification_failed(format!(
            "no free short id for {}",
            long_url
        )))
    }

    fn resolve(&self, id: &str) -> Option<String> {
        self.links.get(id).map(|entry| entry.value().clone())
    }
}

/// Candidate id number `attempt` for `long_url`
fn short_id(long_url: &str, attempt: u32) -> String {
    let mut hasher = DefaultHasher::new();
    long_url.hash(&mut hasher);
    attempt.hash(&mut hasher);
    let mut value = hasher.finish();

    let mut id = String::with_capacity(SHORT_ID_LEN);
    for _ in 0..SHORT_ID_LEN {
        id.push(char::from(ID_ALPHABET[(value % 36) as usize]));
        value /= 36;
    }
    id
}

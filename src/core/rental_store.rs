//! Thread-safe in-memory rental record store
//!
//! This module provides the `InMemoryRentalStore` struct, which holds one
//! record per rental in a `DashMap` keyed by rental id.
//!
//! # Thread Safety
//!
//! `complete` checks the `Active` status and writes the return data under
//! the same per-rental write guard, so a rental can be completed at most
//! once no matter how many callers race on it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::traits::RentalStore;
use crate::types::{DocumentKind, Rental, RentalError, RentalId, RentalState, ReturnDetails};

/// Rental records shared across lifecycle operations
#[derive(Debug, Default)]
pub struct InMemoryRentalStore {
    /// Concurrent map of rentals by id
    rentals: DashMap<RentalId, Rental>,
}

impl InMemoryRentalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rentals: DashMap::new(),
        }
    }

    /// Number of stored rentals
    pub fn len(&self) -> usize {
        self.rentals.len()
    }

    /// Whether no rental has been stored
    pub fn is_empty(&self) -> bool {
        self.rentals.is_empty()
    }
}

impl RentalStore for InMemoryRentalStore {
    fn insert(&self, rental: Rental) -> Result<(), RentalError> {
        match self.rentals.entry(rental.id) {
            Entry::Occupied(_) => Err(RentalError::duplicate_rental(rental.id)),
            Entry::Vacant(slot) => {
                slot.insert(rental);
                Ok(())
            }
        }
    }

    fn find(&self, id: RentalId) -> Result<Option<Rental>, RentalError> {
        Ok(self.rentals.get(&id).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> Result<Vec<Rental>, RentalError> {
        let mut rentals: Vec<Rental> = self
            .rentals
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rentals.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(rentals)
    }

    fn complete(&self, id: RentalId, details: ReturnDetails) -> Result<Rental, RentalError> {
        let mut rental = self
            .rentals
            .get_mut(&id)
            .ok_or_else(|| RentalError::rental_not_found(id))?;

        if !rental.is_active() {
            return Err(RentalError::rental_not_active(id));
        }

        rental.state = RentalState::Completed(Box::new(details));
        Ok(rental.clone())
    }

    fn reinstate(&self, id: RentalId) -> Result<Rental, RentalError> {
        let mut rental = self
            .rentals
            .get_mut(&id)
            .ok_or_else(|| RentalError::rental_not_found(id))?;

        if rental.is_active() {
            return Err(RentalError::rental_not_completed(id));
        }

        rental.state = RentalState::Active;
        rental.invoice_url = None;
        Ok(rental.clone())
    }

    fn attach_document(
        &self,
        id: RentalId,
        kind: DocumentKind,
        reference: &str,
    ) -> Result<(), RentalError> {
        let mut rental = self
            .rentals
            .get_mut(&id)
            .ok_or_else(|| RentalError::rental_not_found(id))?;

        let slot = match kind {
            DocumentKind::Agreement => &mut rental.agreement_url,
            DocumentKind::Invoice => &mut rental.invoice_url,
        };
        *slot = Some(reference.to_string());
        Ok(())
    }
}

//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. It streams journal rows through the
//! `JournalReader` and applies each event on the session's controller in
//! file order.
//!
//! # Memory Efficiency
//!
//! Journal rows are read one at a time; memory grows with the fleet and the
//! rental ledger, not with the journal length.

use crate::io::sync_reader::JournalReader;
use crate::strategy::{ProcessingStrategy, ReplayReport, ReplaySession};
use std::path::Path;
use tracing::warn;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use rental_billing_engine::core::EngineConfig;
/// use rental_billing_engine::strategy::{ProcessingStrategy, ReplaySession, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let session = ReplaySession::from_fleet(Path::new("fleet.csv"), EngineConfig::default())
///     .expect("Fleet could not be loaded");
/// let report = SyncProcessingStrategy
///     .process(&session, Path::new("journal.csv"))
///     .expect("Processing failed");
/// println!("{} events applied", report.applied);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, session: &ReplaySession, journal: &Path) -> Result<ReplayReport, String> {
        let reader = JournalReader::new(journal)?;
        let mut report = ReplayReport::default();

        for result in reader {
            match result {
                Ok(event) => {
                    let rental = event.rental();
                    let outcome = session.controller().apply(event);
                    report.record(rental, &outcome);
                }
                Err(e) => {
                    report.skipped += 1;
                    warn!(error = %e, "Skipping journal record");
                }
            }
        }

        Ok(report)
    }
}

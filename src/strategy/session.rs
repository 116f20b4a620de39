//! Replay session shared by both strategies
//!
//! A `ReplaySession` owns the in-memory fleet and rental ledger that a
//! journal is replayed against, and the controller that mutates them.
//! Strategies only decide how events are read and scheduled.

use crate::core::{
    DocumentPipeline, EngineConfig, InMemoryRentalStore, InMemoryVehicleRegistry,
    LifecycleController, Notifier, RentalStore, VehicleRegistry,
};
use crate::io::csv_format::{write_rentals_csv, write_vehicles_csv};
use crate::io::sync_reader::read_fleet;
use crate::types::{Outcome, Rental, RentalError, RentalId, Vehicle};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Counters collected while replaying a journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Events that committed a transition
    pub applied: usize,

    /// Events rejected by the lifecycle controller
    pub rejected: usize,

    /// Rows that could not be read as events
    pub skipped: usize,

    /// Document or notification failures on committed events
    pub warnings: usize,
}

impl ReplayReport {
    /// Count the result of applying one event
    pub fn record(&mut self, rental: RentalId, result: &Result<Outcome<Rental>, RentalError>) {
        match result {
            Ok(outcome) => {
                self.applied += 1;
                self.warnings += outcome.warnings.len();
            }
            Err(e) => {
                self.rejected += 1;
                warn!(rental, kind = ?e.kind(), error = %e, "Journal event rejected");
            }
        }
    }
}

/// Fleet, ledger and controller for one journal replay
pub struct ReplaySession {
    registry: Arc<InMemoryVehicleRegistry>,
    rentals: Arc<InMemoryRentalStore>,
    controller: LifecycleController,
}

impl ReplaySession {
    /// Create a session over `vehicles`
    ///
    /// # Errors
    ///
    /// Returns an error if two vehicles share an id.
    pub fn new(vehicles: Vec<Vehicle>, config: EngineConfig) -> Result<Self, String> {
        let registry = Arc::new(
            InMemoryVehicleRegistry::with_vehicles(vehicles)
                .map_err(|e| format!("Invalid fleet: {}", e))?,
        );
        let rentals = Arc::new(InMemoryRentalStore::new());
        let controller = LifecycleController::new(
            Arc::clone(&registry) as Arc<dyn VehicleRegistry>,
            Arc::clone(&rentals) as Arc<dyn RentalStore>,
            config,
        );

        Ok(Self {
            registry,
            rentals,
            controller,
        })
    }

    /// Load the fleet CSV at `path` and create a session over it
    pub fn from_fleet(path: &Path, config: EngineConfig) -> Result<Self, String> {
        Self::new(read_fleet(path)?, config)
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentPipeline>) -> Self {
        self.controller = self.controller.with_documents(documents);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.controller = self.controller.with_notifier(notifier);
        self
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Write every rental, sorted by id, as the ledger CSV
    pub fn write_ledger(&self, output: &mut dyn Write) -> Result<(), String> {
        let rentals = self
            .rentals
            .list()
            .map_err(|e| format!("Failed to list rentals: {}", e))?;
        write_rentals_csv(&rentals, output)
    }

    /// Write the final state of every vehicle
    pub fn write_fleet(&self, output: &mut dyn Write) -> Result<(), String> {
        let vehicles = self
            .registry
            .list()
            .map_err(|e| format!("Failed to list vehicles: {}", e))?;
        write_vehicles_csv(&vehicles, output)
    }
}

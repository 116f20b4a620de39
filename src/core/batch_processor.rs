//! Batch processing with vehicle-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays journal
//! batches concurrently while keeping every vehicle's events in order.
//!
//! # Design
//!
//! A vehicle is the unit of contention: a start and the matching return both
//! name the same vehicle, and two starts on one vehicle race for it. The
//! processor therefore partitions each batch by vehicle id, runs each
//! partition sequentially on tokio's blocking pool, and runs the partitions
//! in parallel.
//!
//! A rental id is the other shared key. When one rental id appears on
//! several vehicles in a batch, those vehicles are merged into a single
//! partition so the first event in file order claims the id.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── LifecycleController  (shared registry and rental store)
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::error;

use super::lifecycle::LifecycleController;
use crate::types::{JournalEvent, Outcome, Rental, RentalError, RentalId, VehicleId};

/// Result of applying a single journal event
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The event that was applied
    pub event: JournalEvent,

    /// The committed rental with its warnings, or why the event was rejected
    pub result: Result<Outcome<Rental>, RentalError>,
}

/// Journal batch processor with vehicle-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    controller: LifecycleController,
}

impl BatchProcessor {
    pub fn new(controller: LifecycleController) -> Self {
        Self { controller }
    }

    /// Partition a batch of events by vehicle id
    ///
    /// Vehicles linked by a shared rental id form one partition, keyed by the
    /// lowest vehicle id in the group. Each event appears in exactly one
    /// partition, and events keep their original relative order within a
    /// partition.
    pub fn partition_by_vehicle(
        &self,
        batch: Vec<JournalEvent>,
    ) -> HashMap<VehicleId, Vec<JournalEvent>> {
        let mut groups = VehicleGroups::default();
        let mut rental_vehicles: HashMap<RentalId, VehicleId> = HashMap::new();

        for event in &batch {
            match rental_vehicles.entry(event.rental()) {
                Entry::Occupied(claimed) => groups.union(*claimed.get(), event.vehicle()),
                Entry::Vacant(slot) => {
                    slot.insert(event.vehicle());
                }
            }
        }

        let mut vehicle_batches: HashMap<VehicleId, Vec<JournalEvent>> = HashMap::new();
        for event in batch {
            vehicle_batches
                .entry(groups.find(event.vehicle()))
                .or_default()
                .push(event);
        }

        vehicle_batches
    }

    /// Apply one vehicle's events sequentially on the calling thread
    ///
    /// Every event is applied even if an earlier one fails. Results are in
    /// input order.
    pub fn apply_events(&self, events: Vec<JournalEvent>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(events.len());

        for event in events {
            let result = self.controller.apply(event.clone());
            results.push(ProcessingResult { event, result });
        }

        results
    }

    /// Apply one vehicle's events on tokio's blocking pool
    ///
    /// Applying an event may render documents and send notifications
    /// through blocking collaborators, so the work stays off the async
    /// worker threads.
    pub async fn process_vehicle_events(&self, events: Vec<JournalEvent>) -> Vec<ProcessingResult> {
        let processor = self.clone();
        match tokio::task::spawn_blocking(move || processor.apply_events(events)).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Vehicle events task panicked");
                Vec::new()
            }
        }
    }

    /// Apply a batch, one tokio task per vehicle
    ///
    /// Results of different vehicles may be interleaved in any order.
    pub async fn process_batch(&self, batch: Vec<JournalEvent>) -> Vec<ProcessingResult> {
        let vehicle_batches = self.partition_by_vehicle(batch);

        let mut tasks = Vec::with_capacity(vehicle_batches.len());
        for (_vehicle, events) in vehicle_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_vehicle_events(events).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(vehicle_results) => results.extend(vehicle_results),
                Err(e) => error!(error = %e, "Vehicle task panicked"),
            }
        }

        results
    }
}

/// Union-find over vehicle ids; only merged vehicles have an entry
#[derive(Debug, Default)]
struct VehicleGroups {
    parent: HashMap<VehicleId, VehicleId>,
}

impl VehicleGroups {
    fn find(&mut self, vehicle: VehicleId) -> VehicleId {
        let mut root = vehicle;
        while let Some(&parent) = self.parent.get(&root) {
            root = parent;
        }

        let mut current = vehicle;
        while current != root {
            let next = self.parent.insert(current, root).unwrap_or(root);
            current = next;
        }

        root
    }

    fn union(&mut self, a: VehicleId, b: VehicleId) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent.insert(a.max(b), a.min(b));
        }
    }
}

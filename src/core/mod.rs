//! Core business logic module
//!
//! This module contains the rental billing and lifecycle components:
//! - `calculator` - Pure cost calculation for a returned rental
//! - `config` - Late-hour rounding and rate policies
//! - `traits` - Collaborator seams (registry, store, documents, notifier)
//! - `registry` - DashMap-backed vehicle registry
//! - `rental_store` - DashMap-backed rental record store
//! - `lifecycle` - Start and return orchestration with compensation
//! - `batch_processor` - Concurrent journal replay partitioned by vehicle

pub mod batch_processor;
pub mod calculator;
pub mod config;
pub mod lifecycle;
pub mod registry;
pub mod rental_store;
pub mod traits;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use calculator::CostCalculator;
pub use config::{EngineConfig, LateHourRounding, RatePolicy};
pub use lifecycle::LifecycleController;
pub use registry::InMemoryVehicleRegistry;
pub use rental_store::InMemoryRentalStore;
pub use traits::{DocumentPipeline, Notifier, RentalStore, VehicleRegistry};

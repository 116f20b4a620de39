//! Rental Billing Engine Library
//! # Overview
//!
//! This library manages the lifecycle of vehicle rentals and computes what a
//! customer owes when a vehicle comes back. Journals of start and return
//! events can be replayed with a synchronous or an asynchronous strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Vehicle, Rental, CostBreakdown, RentalError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::calculator`] - Pure cost calculation
//!   - [`core::lifecycle`] - Start and return orchestration with compensation
//!   - [`core::registry`] - Vehicle status and mileage
//!   - [`core::rental_store`] - Rental records
//!   - [`core::batch_processor`] - Concurrent replay partitioned by vehicle
//! - [`io`] - CSV formats, readers, document rendering and SMS outbox
//! - [`strategy`] - Sync and async journal replay
//!
//! # Billing
//!
//! A returned rental is billed as:
//!
//! - **Base**: rental days times the daily rate
//! - **Extra mileage**: kilometres beyond the daily allowance times the extra km price
//! - **Late fee**: hours past the planned return times the late fee per hour
//! - **Damage**: repair charges recorded at return
//!
//! The advance payment is subtracted from the subtotal. A negative balance
//! is a credit owed to the customer.
//!
//! # Vehicle States
//!
//! Each vehicle is either `Available` or `Rented` by exactly one active
//! rental. Only the lifecycle controller changes a vehicle's status or
//! mileage.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    CostCalculator, EngineConfig, InMemoryRentalStore, InMemoryVehicleRegistry,
    LifecycleController,
};
pub use io::{write_rentals_csv, write_vehicles_csv};
pub use types::{
    CostBreakdown, CostInput, Outcome, Rental, RentalError, RentalId, RentalStatus, Vehicle,
    VehicleId, VehicleStatus,
};

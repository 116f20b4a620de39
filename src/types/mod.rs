//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `vehicle`: Vehicles, availability and rate schedules
//! - `rental`: Rental records, lifecycle requests and journal events
//! - `billing`: Cost calculation inputs and itemised breakdowns
//! - `outcome`: Committed results carrying post-commit warnings
//! - `error`: Error types for the rental billing engine

pub mod billing;
pub mod error;
pub mod outcome;
pub mod rental;
pub mod vehicle;

pub use billing::{format_money, round_money, CostBreakdown, CostInput};
pub use error::{ErrorKind, RentalError};
pub use outcome::{DispatchStage, Outcome, Warning};
pub use rental::{
    CustomerDetails, DocumentKind, JournalEvent, NewRental, Notification, Rental, RentalId,
    RentalState, RentalStatus, ReturnDetails, ReturnRental,
};
pub use vehicle::{
    RateSchedule, Vehicle, VehicleId, VehicleStatus, VehicleUpdate, DEFAULT_KM_LIMIT_PER_DAY,
};

//! Error types for the rental billing engine
//!
//! This module defines all error types that can occur while billing and
//! transitioning rentals, and while reading journals on the command line.
//!
//! # Error Categories
//!
//! - **Validation Errors**: bad rental days, negative rates or amounts, odometer going backwards
//! - **Conflict Errors**: vehicle no longer available, rental already completed, duplicate ids
//! - **Not Found Errors**: unknown vehicle or rental
//! - **Storage Errors**: a store write failed, or a compensating write failed
//! - **Downstream Errors**: document or notification failures (reported as warnings)
//! - **File I/O and Parse Errors**: journal and fleet input handling

use rust_decimal::Decimal;
use thiserror::Error;

/// Broad class of a [`RentalError`]
///
/// Callers use the kind to decide how to react: correct the input, refresh
/// and retry, or surface a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input must be corrected before retrying
    Validation,

    /// A precondition no longer holds; refresh and retry
    Conflict,

    /// The referenced vehicle or rental does not exist
    NotFound,

    /// The backing store rejected a write
    Storage,

    /// Document or notification delivery failed
    Downstream,

    /// A decimal calculation overflowed
    Arithmetic,

    /// Reading or writing files failed
    Io,

    /// Input could not be parsed
    Parse,
}

/// Main error type for the rental billing engine
///
/// Every variant carries the context needed to report the failure to an
/// operator. None of them is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RentalError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Agreed rental period is shorter than one day
    #[error("Rental days must be at least 1, got {days}")]
    InvalidRentalDays {
        /// The rejected number of days
        days: u32,
    },

    /// A rate field is negative
    #[error("Rate {field} must not be negative, got {value}")]
    NegativeRate {
        /// Name of the rate field
        field: String,
        /// The rejected value
        value: Decimal,
    },

    /// A mileage or money amount is negative
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount {
        /// Name of the amount field
        field: String,
        /// The rejected value
        value: Decimal,
    },

    /// End odometer reading is lower than the start reading
    #[error("End mileage {end} is less than start mileage {start}")]
    MileageDecreased {
        /// Odometer at rental start
        start: Decimal,
        /// Odometer supplied at return
        end: Decimal,
    },

    /// The vehicle named in a return does not match the rental's vehicle
    #[error("Vehicle mismatch for rental {rental}: expected vehicle {expected}, got vehicle {actual}")]
    VehicleMismatch {
        /// Rental ID
        rental: u32,
        /// Vehicle recorded on the rental
        expected: u32,
        /// Vehicle supplied with the request
        actual: u32,
    },

    /// Vehicle does not exist in the registry
    #[error("Vehicle {vehicle} not found")]
    VehicleNotFound {
        /// Vehicle ID
        vehicle: u32,
    },

    /// Rental does not exist in the store
    #[error("Rental {rental} not found")]
    RentalNotFound {
        /// Rental ID
        rental: u32,
    },

    /// Vehicle is not available for a new rental
    #[error("Vehicle {vehicle} is no longer available")]
    VehicleUnavailable {
        /// Vehicle ID
        vehicle: u32,
    },

    /// Vehicle is not held by the given rental
    #[error("Vehicle {vehicle} is not rented by rental {rental}")]
    VehicleNotHeld {
        /// Vehicle ID
        vehicle: u32,
        /// Rental that attempted the release
        rental: u32,
    },

    /// Vehicle cannot be removed while rented
    #[error("Vehicle {vehicle} is rented and cannot be removed")]
    VehicleInUse {
        /// Vehicle ID
        vehicle: u32,
    },

    /// Vehicle ID already registered
    #[error("Duplicate vehicle ID {vehicle}")]
    DuplicateVehicle {
        /// Vehicle ID
        vehicle: u32,
    },

    /// Rental ID already used
    #[error("Duplicate rental ID {rental}")]
    DuplicateRental {
        /// Rental ID
        rental: u32,
    },

    /// Rental is not active (already completed)
    #[error("Rental {rental} is already completed")]
    RentalNotActive {
        /// Rental ID
        rental: u32,
    },

    /// Rental is not completed, so there is nothing to reinstate
    #[error("Rental {rental} is not completed")]
    RentalNotCompleted {
        /// Rental ID
        rental: u32,
    },

    /// Arithmetic overflow in a billing step
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Billing step that overflowed
        operation: String,
    },

    /// The backing store failed a read or write
    #[error("Storage error: {message}")]
    StorageError {
        /// Description of the failure
        message: String,
    },

    /// A compensating write failed, leaving rental and vehicle out of step
    #[error("Compensation for {operation} failed: {message}")]
    CompensationFailed {
        /// Operation being compensated
        operation: String,
        /// Description of the failure
        message: String,
    },

    /// Document generation failed
    #[error("Document generation failed: {message}")]
    DocumentFailed {
        /// Description of the failure
        message: String,
    },

    /// Customer notification failed
    #[error("Notification failed: {message}")]
    NotificationFailed {
        /// Description of the failure
        message: String,
    },
}

impl RentalError {
    /// Broad class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RentalError::FileNotFound { .. } | RentalError::IoError { .. } => ErrorKind::Io,
            RentalError::ParseError { .. } => ErrorKind::Parse,
            RentalError::InvalidRentalDays { .. }
            | RentalError::NegativeRate { .. }
            | RentalError::NegativeAmount { .. }
            | RentalError::MileageDecreased { .. }
            | RentalError::VehicleMismatch { .. } => ErrorKind::Validation,
            RentalError::VehicleNotFound { .. } | RentalError::RentalNotFound { .. } => {
                ErrorKind::NotFound
            }
            RentalError::VehicleUnavailable { .. }
            | RentalError::VehicleNotHeld { .. }
            | RentalError::VehicleInUse { .. }
            | RentalError::DuplicateVehicle { .. }
            | RentalError::DuplicateRental { .. }
            | RentalError::RentalNotActive { .. }
            | RentalError::RentalNotCompleted { .. } => ErrorKind::Conflict,
            RentalError::ArithmeticOverflow { .. } => ErrorKind::Arithmetic,
            RentalError::StorageError { .. } | RentalError::CompensationFailed { .. } => {
                ErrorKind::Storage
            }
            RentalError::DocumentFailed { .. } | RentalError::NotificationFailed { .. } => {
                ErrorKind::Downstream
            }
        }
    }
}

// Conversion from io::Error to RentalError
impl From<std::io::Error> for RentalError {
    fn from(error: std::io::Error) -> Self {
        RentalError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to RentalError
impl From<csv::Error> for RentalError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        RentalError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl RentalError {
    /// Create an InvalidRentalDays error
    pub fn invalid_rental_days(days: u32) -> Self {
        RentalError::InvalidRentalDays { days }
    }

    /// Create a NegativeRate error
    pub fn negative_rate(field: &str, value: Decimal) -> Self {
        RentalError::NegativeRate {
            field: field.to_string(),
            value,
        }
    }

    /// Create a NegativeAmount error
    pub fn negative_amount(field: &str, value: Decimal) -> Self {
        RentalError::NegativeAmount {
            field: field.to_string(),
            value,
        }
    }

    /// Create a MileageDecreased error
    pub fn mileage_decreased(start: Decimal, end: Decimal) -> Self {
        RentalError::MileageDecreased { start, end }
    }

    /// Create a VehicleMismatch error
    pub fn vehicle_mismatch(rental: u32, expected: u32, actual: u32) -> Self {
        RentalError::VehicleMismatch {
            rental,
            expected,
            actual,
        }
    }

    /// Create a VehicleNotFound error
    pub fn vehicle_not_found(vehicle: u32) -> Self {
        RentalError::VehicleNotFound { vehicle }
    }

    /// Create a RentalNotFound error
    pub fn rental_not_found(rental: u32) -> Self {
        RentalError::RentalNotFound { rental }
    }

    /// Create a VehicleUnavailable error
    pub fn vehicle_unavailable(vehicle: u32) -> Self {
        RentalError::VehicleUnavailable { vehicle }
    }

    /// Create a VehicleNotHeld error
    pub fn vehicle_not_held(vehicle: u32, rental: u32) -> Self {
        RentalError::VehicleNotHeld { vehicle, rental }
    }

    /// Create a VehicleInUse error
    pub fn vehicle_in_use(vehicle: u32) -> Self {
        RentalError::VehicleInUse { vehicle }
    }

    /// Create a DuplicateVehicle error
    pub fn duplicate_vehicle(vehicle: u32) -> Self {
        RentalError::DuplicateVehicle { vehicle }
    }

    /// Create a DuplicateRental error
    pub fn duplicate_rental(rental: u32) -> Self {
        RentalError::DuplicateRental { rental }
    }

    /// Create a RentalNotActive error
    pub fn rental_not_active(rental: u32) -> Self {
        RentalError::RentalNotActive { rental }
    }

    /// Create a RentalNotCompleted error
    pub fn rental_not_completed(rental: u32) -> Self {
        RentalError::RentalNotCompleted { rental }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        RentalError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a StorageError
    pub fn storage(message: impl Into<String>) -> Self {
        RentalError::StorageError {
            message: message.into(),
        }
    }

    /// Create a CompensationFailed error
    pub fn compensation_failed(operation: &str, cause: &RentalError) -> Self {
        RentalError::CompensationFailed {
            operation: operation.to_string(),
            message: cause.to_string(),
        }
    }

    /// Create a DocumentFailed error
    pub fn document_failed(message: impl Into<String>) -> Self {
        RentalError::DocumentFailed {
            message: message.into(),
        }
    }

    /// Create a NotificationFailed error
    pub fn notification_failed(message: impl Into<String>) -> Self {
        RentalError::NotificationFailed {
            message: message.into(),
        }
    }
}

//! Vehicle-related types for the rental billing engine
//!
//! This module defines the vehicle record held by the registry, its
//! availability status, and the rate schedule used for billing.

use super::error::RentalError;
use super::rental::RentalId;
use rust_decimal::Decimal;
use std::fmt;

/// Vehicle identifier
pub type VehicleId = u32;

/// Kilometre allowance per day applied when a vehicle has none configured
pub const DEFAULT_KM_LIMIT_PER_DAY: u32 = 100;

/// Availability of a vehicle in the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    /// Free to be rented
    Available,

    /// Held by an active rental
    Rented,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "Available"),
            VehicleStatus::Rented => write!(f, "Rented"),
        }
    }
}

/// Billing rates of a vehicle
///
/// All monetary fields are per-unit prices in the company's currency.
/// Rates are copied onto a rental when it starts so later price edits do not
/// change what an in-flight rental is billed.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    /// Price per rental day
    pub daily_rate: Decimal,

    /// Kilometres included per rental day
    ///
    /// `None` or zero means [`DEFAULT_KM_LIMIT_PER_DAY`].
    pub km_limit_per_day: Option<u32>,

    /// Price per kilometre driven beyond the allowance
    pub extra_km_price: Decimal,

    /// Price per started hour of late return
    pub late_fee_per_hour: Decimal,
}

impl RateSchedule {
    /// Create a rate schedule
    pub fn new(
        daily_rate: Decimal,
        km_limit_per_day: Option<u32>,
        extra_km_price: Decimal,
        late_fee_per_hour: Decimal,
    ) -> Self {
        RateSchedule {
            daily_rate,
            km_limit_per_day,
            extra_km_price,
            late_fee_per_hour,
        }
    }

    /// Kilometre allowance per day with the default applied
    pub fn effective_km_limit(&self) -> u32 {
        match self.km_limit_per_day {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_KM_LIMIT_PER_DAY,
        }
    }

    /// Check that no rate is negative
    ///
    /// # Errors
    ///
    /// Returns `RentalError::NegativeRate` naming the first offending field.
    pub fn validate(&self) -> Result<(), RentalError> {
        let fields = [
            ("daily_rate", self.daily_rate),
            ("extra_km_price", self.extra_km_price),
            ("late_fee_per_hour", self.late_fee_per_hour),
        ];

        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(RentalError::negative_rate(field, value));
            }
        }

        Ok(())
    }
}

/// A vehicle in the fleet
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Unique vehicle identifier
    pub id: VehicleId,

    /// Display name (make and model)
    pub name: String,

    /// Registration plate
    pub plate_number: String,

    /// Whether the vehicle can be rented
    pub status: VehicleStatus,

    /// Odometer reading recorded at the last start or return
    pub current_mileage: Decimal,

    /// Current billing rates
    pub rates: RateSchedule,

    /// Rental currently holding the vehicle
    ///
    /// Set together with `status = Rented` and cleared on release. Only the
    /// holding rental can release the vehicle.
    pub current_rental: Option<RentalId>,
}

impl Vehicle {
    /// Create an available vehicle
    pub fn new(
        id: VehicleId,
        name: impl Into<String>,
        plate_number: impl Into<String>,
        current_mileage: Decimal,
        rates: RateSchedule,
    ) -> Self {
        Vehicle {
            id,
            name: name.into(),
            plate_number: plate_number.into(),
            status: VehicleStatus::Available,
            current_mileage,
            rates,
            current_rental: None,
        }
    }

    /// Whether the vehicle can accept a new rental
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}

/// Editable vehicle details
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleUpdate {
    pub name: Option<String>,
    pub plate_number: Option<String>,
    pub current_mileage: Option<Decimal>,
    pub rates: Option<RateSchedule>,
}

//! Billing types for the rental billing engine
//!
//! This module defines the inputs of the cost calculation and the itemised
//! breakdown it produces, plus the presentation rounding applied to money.
//!
//! All values are carried at full precision. Rounding to two decimal places
//! only happens through [`round_money`] when a value is shown to a person
//! (ledger output, invoice documents).

use super::vehicle::RateSchedule;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Everything needed to bill a returned rental
#[derive(Debug, Clone, PartialEq)]
pub struct CostInput {
    /// Agreed rental period in days (at least 1)
    pub rental_days: u32,

    /// Rates the rental is billed with
    pub rates: RateSchedule,

    /// Odometer at the start of the rental
    pub start_mileage: Decimal,

    /// Odometer at return
    pub end_mileage: Decimal,

    /// When the rental started
    pub started_at: DateTime<Utc>,

    /// When the vehicle came back
    pub returned_at: DateTime<Utc>,

    /// Amount paid up front
    pub advance_payment: Decimal,

    /// Damage and repair charges
    pub damage_cost: Decimal,
}

/// Itemised cost of a returned rental
///
/// `final_balance_due` is `subtotal - advance_payment` and may be negative,
/// in which case the customer is owed a credit.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    /// Rates the breakdown was computed with
    pub rates: RateSchedule,

    /// Agreed rental period in days
    pub rental_days: u32,

    /// Kilometres between start and end readings
    pub distance_driven: Decimal,

    /// Kilometres included in the rental (`rental_days * km_limit_per_day`)
    pub allowed_distance: Decimal,

    /// Kilometres driven beyond the allowance
    pub extra_km: Decimal,

    /// `extra_km * extra_km_price`
    pub extra_km_cost: Decimal,

    /// Start date plus the agreed number of calendar days
    pub planned_return: DateTime<Utc>,

    /// Whole hours billed as late
    pub late_hours: u64,

    /// `late_hours * late_fee_per_hour`
    pub late_fee_cost: Decimal,

    /// `rental_days * daily_rate`
    pub base_cost: Decimal,

    /// Damage and repair charges
    pub damage_cost: Decimal,

    /// `base_cost + extra_km_cost + late_fee_cost + damage_cost`
    pub subtotal: Decimal,

    /// Amount paid up front
    pub advance_payment: Decimal,

    /// `subtotal - advance_payment`, not clamped at zero
    pub final_balance_due: Decimal,
}

impl CostBreakdown {
    /// Whether the customer overpaid and is owed money back
    pub fn is_credit(&self) -> bool {
        self.final_balance_due < Decimal::ZERO
    }

    /// Copy of the breakdown with every money field rounded for display
    pub fn rounded(&self) -> CostBreakdown {
        CostBreakdown {
            extra_km_cost: round_money(self.extra_km_cost),
            late_fee_cost: round_money(self.late_fee_cost),
            base_cost: round_money(self.base_cost),
            damage_cost: round_money(self.damage_cost),
            subtotal: round_money(self.subtotal),
            advance_payment: round_money(self.advance_payment),
            final_balance_due: round_money(self.final_balance_due),
            ..self.clone()
        }
    }
}

/// Round a money value to two decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a money value with exactly two decimal places
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

//! Rental cost calculation
//!
//! This module provides the `CostCalculator`, a pure function from a
//! rental's agreed terms and return readings to an itemised breakdown.
//!
//! # Billing Steps
//!
//! ```text
//! distance_driven   = end_mileage - start_mileage
//! allowed_distance  = rental_days * km_limit_per_day
//! extra_km          = max(0, distance_driven - allowed_distance)
//! extra_km_cost     = extra_km * extra_km_price
//! late_hours        = hours between planned return and actual return (0 if on time)
//! late_fee_cost     = late_hours * late_fee_per_hour
//! base_cost         = rental_days * daily_rate
//! subtotal          = base_cost + extra_km_cost + late_fee_cost + damage_cost
//! final_balance_due = subtotal - advance_payment
//! ```
//!
//! The planned return is the start time plus `rental_days` calendar days. The
//! agreed `rental_days` is never recomputed from the elapsed time.
//!
//! Every step uses checked decimal arithmetic; an overflow is reported as
//! `RentalError::ArithmeticOverflow` naming the step.

use chrono::{DateTime, Days, Utc};
use rust_decimal::Decimal;

use super::config::LateHourRounding;
use crate::types::{CostBreakdown, CostInput, RentalError};

const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Pure, deterministic rental cost calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct CostCalculator {
    rounding: LateHourRounding,
}

impl CostCalculator {
    /// Create a calculator with the given late-hour rounding policy
    pub fn new(rounding: LateHourRounding) -> Self {
        Self { rounding }
    }

    /// Compute the itemised cost of a returned rental
    ///
    /// # Errors
    ///
    /// * `RentalError::InvalidRentalDays` - `rental_days` is zero
    /// * `RentalError::NegativeRate` - any rate is negative
    /// * `RentalError::NegativeAmount` - negative start mileage, advance or damage
    /// * `RentalError::MileageDecreased` - end mileage below start mileage
    /// * `RentalError::ArithmeticOverflow` - a step overflowed
    pub fn calculate(&self, input: &CostInput) -> Result<CostBreakdown, RentalError> {
        validate(input)?;

        let rates = &input.rates;
        let days = Decimal::from(input.rental_days);

        let distance_driven = checked_sub(input.end_mileage, input.start_mileage, "distance_driven")?;
        let allowed_distance = checked_mul(
            days,
            Decimal::from(rates.effective_km_limit()),
            "allowed_distance",
        )?;
        let extra_km = if distance_driven > allowed_distance {
            checked_sub(distance_driven, allowed_distance, "extra_km")?
        } else {
            Decimal::ZERO
        };
        let extra_km_cost = checked_mul(extra_km, rates.extra_km_price, "extra_km_cost")?;

        let planned_return = input
            .started_at
            .checked_add_days(Days::new(u64::from(input.rental_days)))
            .ok_or_else(|| RentalError::arithmetic_overflow("planned_return"))?;
        let late_hours = self.late_hours(planned_return, input.returned_at);
        let late_fee_cost = checked_mul(
            Decimal::from(late_hours),
            rates.late_fee_per_hour,
            "late_fee_cost",
        )?;

        let base_cost = checked_mul(days, rates.daily_rate, "base_cost")?;

        let subtotal = [extra_km_cost, late_fee_cost, input.damage_cost]
            .into_iter()
            .try_fold(base_cost, |sum, item| checked_add(sum, item, "subtotal"))?;
        let final_balance_due = checked_sub(subtotal, input.advance_payment, "final_balance_due")?;

        Ok(CostBreakdown {
            rates: rates.clone(),
            rental_days: input.rental_days,
            distance_driven,
            allowed_distance,
            extra_km,
            extra_km_cost,
            planned_return,
            late_hours,
            late_fee_cost,
            base_cost,
            damage_cost: input.damage_cost,
            subtotal,
            advance_payment: input.advance_payment,
            final_balance_due,
        })
    }

    /// Whole hours billed for returning after `planned`
    ///
    /// Returns 0 for an on-time or early return.
    pub fn late_hours(&self, planned: DateTime<Utc>, returned: DateTime<Utc>) -> u64 {
        let late_ms = (returned - planned).num_milliseconds();
        if late_ms <= 0 {
            return 0;
        }

        let late_ms = late_ms.unsigned_abs();
        match self.rounding {
            LateHourRounding::Ceil => late_ms.div_ceil(MILLIS_PER_HOUR),
            LateHourRounding::Floor => late_ms / MILLIS_PER_HOUR,
        }
    }
}

fn validate(input: &CostInput) -> Result<(), RentalError> {
    if input.rental_days < 1 {
        return Err(RentalError::invalid_rental_days(input.rental_days));
    }

    input.rates.validate()?;

    let amounts = [
        ("start_mileage", input.start_mileage),
        ("advance_payment", input.advance_payment),
        ("damage_cost", input.damage_cost),
    ];
    for (field, value) in amounts {
        if value < Decimal::ZERO {
            return Err(RentalError::negative_amount(field, value));
        }
    }

    if input.end_mileage < input.start_mileage {
        return Err(RentalError::mileage_decreased(
            input.start_mileage,
            input.end_mileage,
        ));
    }

    Ok(())
}

fn checked_add(a: Decimal, b: Decimal, step: &str) -> Result<Decimal, RentalError> {
    a.checked_add(b)
        .ok_or_else(|| RentalError::arithmetic_overflow(step))
}

fn checked_sub(a: Decimal, b: Decimal, step: &str) -> Result<Decimal, RentalError> {
    a.checked_sub(b)
        .ok_or_else(|| RentalError::arithmetic_overflow(step))
}

fn checked_mul(a: Decimal, b: Decimal, step: &str) -> Result<Decimal, RentalError> {
    a.checked_mul(b)
        .ok_or_else(|| RentalError::arithmetic_overflow(step))
}

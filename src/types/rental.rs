//! Rental-related types for the rental billing engine
//!
//! This module defines the rental record and its two-state lifecycle, the
//! requests that drive it (start and return), and the journal events read by
//! the command-line front end.

use super::billing::CostBreakdown;
use super::vehicle::{RateSchedule, Vehicle, VehicleId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Rental identifier
pub type RentalId = u32;

/// Lifecycle status of a rental
///
/// The only transition is `Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalStatus {
    Active,
    Completed,
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RentalStatus::Active => write!(f, "active"),
            RentalStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Customer fields collected at rental start
///
/// Opaque to billing; carried through to documents and notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub national_id: String,
    pub phone: String,
    pub address: String,
}

/// Readings and charges recorded when a rental is returned
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnDetails {
    /// Odometer at return
    pub end_mileage: Decimal,

    /// When the vehicle came back
    pub returned_at: DateTime<Utc>,

    /// Itemised cost computed at return
    pub breakdown: CostBreakdown,

    /// Reference to the customer's return signature
    pub signature: String,

    /// Free-form return remarks
    pub remarks: Option<String>,
}

impl ReturnDetails {
    /// Amount billed at return (the balance after the advance)
    pub fn final_total_cost(&self) -> Decimal {
        self.breakdown.final_balance_due
    }

    /// Charge for kilometres beyond the allowance
    pub fn extra_mileage_cost(&self) -> Decimal {
        self.breakdown.extra_km_cost
    }

    /// Damage and repair charges
    pub fn damage_cost(&self) -> Decimal {
        self.breakdown.damage_cost
    }
}

/// State of a rental, carrying return data once completed
#[derive(Debug, Clone, PartialEq)]
pub enum RentalState {
    Active,
    Completed(Box<ReturnDetails>),
}

/// A rental record
#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    /// Unique rental identifier
    pub id: RentalId,

    /// Rented vehicle
    pub vehicle: VehicleId,

    /// Vehicle name at rental start
    pub vehicle_name: String,

    /// Vehicle plate at rental start
    pub vehicle_plate: String,

    /// Customer details
    pub customer: CustomerDetails,

    /// Agreed rental period in days
    ///
    /// Fixed at creation; never recomputed from the actual return time.
    pub rental_days: u32,

    /// Odometer at rental start
    pub start_mileage: Decimal,

    /// Amount paid up front
    pub advance_payment: Decimal,

    /// When the rental started
    pub started_at: DateTime<Utc>,

    /// Vehicle rates captured at rental start
    pub rates: RateSchedule,

    /// Reference to the customer's agreement signature
    pub signature: String,

    /// Free-form remarks captured at rental start
    pub remarks: Option<String>,

    /// Reference to the generated rental agreement
    pub agreement_url: Option<String>,

    /// Reference to the generated return invoice
    pub invoice_url: Option<String>,

    /// Lifecycle state
    pub state: RentalState,
}

impl Rental {
    /// Open an active rental for a vehicle, snapshotting its rates
    pub fn open(request: NewRental, vehicle: &Vehicle) -> Self {
        Rental {
            id: request.id,
            vehicle: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            vehicle_plate: vehicle.plate_number.clone(),
            customer: request.customer,
            rental_days: request.rental_days,
            start_mileage: request.start_mileage,
            advance_payment: request.advance_payment,
            started_at: request.started_at,
            rates: vehicle.rates.clone(),
            signature: request.signature,
            remarks: request.remarks,
            agreement_url: None,
            invoice_url: None,
            state: RentalState::Active,
        }
    }

    /// Current lifecycle status
    pub fn status(&self) -> RentalStatus {
        match self.state {
            RentalState::Active => RentalStatus::Active,
            RentalState::Completed(_) => RentalStatus::Completed,
        }
    }

    /// Whether the rental can still be returned
    pub fn is_active(&self) -> bool {
        self.status() == RentalStatus::Active
    }

    /// Return data, present once completed
    pub fn return_details(&self) -> Option<&ReturnDetails> {
        match &self.state {
            RentalState::Active => None,
            RentalState::Completed(details) => Some(details),
        }
    }
}

/// Kind of document generated for a rental
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Signed rental agreement, generated at start
    Agreement,

    /// Itemised return invoice, generated at return
    Invoice,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Agreement => write!(f, "agreement"),
            DocumentKind::Invoice => write!(f, "invoice"),
        }
    }
}

/// Request to start a rental
#[derive(Debug, Clone, PartialEq)]
pub struct NewRental {
    pub id: RentalId,
    pub vehicle: VehicleId,
    pub customer: CustomerDetails,
    pub rental_days: u32,
    pub start_mileage: Decimal,
    pub advance_payment: Decimal,
    pub started_at: DateTime<Utc>,
    pub signature: String,
    pub remarks: Option<String>,
}

/// Request to return a rental
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRental {
    pub id: RentalId,

    /// Vehicle being returned; must match the rental's vehicle
    pub vehicle: VehicleId,

    pub end_mileage: Decimal,
    pub returned_at: DateTime<Utc>,
    pub damage_cost: Decimal,
    pub signature: String,
    pub remarks: Option<String>,
}

/// Message to send to a customer once a document exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: DocumentKind,
    pub customer_name: String,
    pub customer_phone: String,
    pub link: String,
}

impl Notification {
    /// Build the notification for a rental's document
    pub fn for_rental(rental: &Rental, kind: DocumentKind, link: impl Into<String>) -> Self {
        Notification {
            kind,
            customer_name: rental.customer.name.clone(),
            customer_phone: rental.customer.phone.clone(),
            link: link.into(),
        }
    }
}

/// One operator action read from a journal
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEvent {
    Start(NewRental),
    Return(ReturnRental),
}

impl JournalEvent {
    /// Rental the event applies to
    pub fn rental(&self) -> RentalId {
        match self {
            JournalEvent::Start(request) => request.id,
            JournalEvent::Return(request) => request.id,
        }
    }

    /// Vehicle the event applies to
    pub fn vehicle(&self) -> VehicleId {
        match self {
            JournalEvent::Start(request) => request.vehicle,
            JournalEvent::Return(request) => request.vehicle,
        }
    }
}

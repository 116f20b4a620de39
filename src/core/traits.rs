//! Collaborator traits injected into the lifecycle controller
//!
//! This module defines the seams between the billing core and its
//! collaborators: the vehicle registry, the rental record store, the document
//! pipeline and the notifier. The controller only holds these as
//! `Arc<dyn Trait>`, so in-memory, remote or failing test implementations can
//! be swapped in freely.

use crate::types::{
    CustomerDetails, DocumentKind, Notification, Rental, RentalError, RentalId, ReturnDetails,
    Vehicle, VehicleId, VehicleUpdate,
};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Fleet storage with the conditional updates a rental needs
///
/// `acquire` and `release` must each be a single atomic check-and-set per
/// vehicle: two concurrent acquisitions of the same vehicle produce exactly
/// one success.
pub trait VehicleRegistry: Send + Sync {
    /// Add a vehicle to the fleet
    fn register(&self, vehicle: Vehicle) -> Result<(), RentalError>;

    /// Look up a vehicle
    fn find(&self, id: VehicleId) -> Result<Option<Vehicle>, RentalError>;

    /// Look up a vehicle that must exist
    fn get(&self, id: VehicleId) -> Result<Vehicle, RentalError> {
        self.find(id)?
            .ok_or_else(|| RentalError::vehicle_not_found(id))
    }

    /// All vehicles, sorted by name then id
    fn list(&self) -> Result<Vec<Vehicle>, RentalError>;

    /// Edit name, plate, mileage or rates
    fn update_details(&self, id: VehicleId, update: VehicleUpdate) -> Result<Vehicle, RentalError>;

    /// Remove a vehicle that is not currently rented
    fn remove(&self, id: VehicleId) -> Result<Vehicle, RentalError>;

    /// Mark an available vehicle as rented by `rental`
    ///
    /// Sets `status = Rented`, `current_rental = rental` and
    /// `current_mileage = start_mileage`. Returns the vehicle as it was
    /// before the change so the caller can restore it.
    ///
    /// # Errors
    ///
    /// `RentalError::VehicleUnavailable` when the vehicle is already rented.
    fn acquire(
        &self,
        id: VehicleId,
        rental: RentalId,
        start_mileage: Decimal,
    ) -> Result<Vehicle, RentalError>;

    /// Return a vehicle held by `rental` to the fleet
    ///
    /// Guarded on `status = Rented` and `current_rental = rental`; sets
    /// `Available` and `current_mileage = end_mileage`.
    fn release(
        &self,
        id: VehicleId,
        rental: RentalId,
        end_mileage: Decimal,
    ) -> Result<Vehicle, RentalError>;

    /// Undo an `acquire` made by `rental`, putting `previous` back
    fn restore(&self, previous: &Vehicle, rental: RentalId) -> Result<(), RentalError>;
}

/// Rental record storage with a conditional completion
pub trait RentalStore: Send + Sync {
    /// Store a new rental; the id must be unused
    fn insert(&self, rental: Rental) -> Result<(), RentalError>;

    /// Look up a rental
    fn find(&self, id: RentalId) -> Result<Option<Rental>, RentalError>;

    /// Look up a rental that must exist
    fn get(&self, id: RentalId) -> Result<Rental, RentalError> {
        self.find(id)?.ok_or_else(|| RentalError::rental_not_found(id))
    }

    /// All rentals, newest start first
    fn list(&self) -> Result<Vec<Rental>, RentalError>;

    /// Transition an active rental to completed
    ///
    /// Must be a single atomic check-and-set: of two concurrent completions
    /// of the same rental exactly one succeeds, the other gets
    /// `RentalError::RentalNotActive`.
    fn complete(&self, id: RentalId, details: ReturnDetails) -> Result<Rental, RentalError>;

    /// Put a completed rental back to active
    ///
    /// Compensation for a return whose vehicle release failed. Clears the
    /// return data and the invoice reference.
    fn reinstate(&self, id: RentalId) -> Result<Rental, RentalError>;

    /// Record the reference of a generated document
    fn attach_document(
        &self,
        id: RentalId,
        kind: DocumentKind,
        reference: &str,
    ) -> Result<(), RentalError>;

    /// Rentals whose customer or vehicle name contains `query`, ignoring case
    fn search(&self, query: &str) -> Result<Vec<Rental>, RentalError> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|rental| {
                rental.customer.name.to_lowercase().contains(&needle)
                    || rental.vehicle_name.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Distinct customers by national id, most recent rental first
    fn past_customers(&self) -> Result<Vec<CustomerDetails>, RentalError> {
        let mut seen = HashSet::new();
        Ok(self
            .list()?
            .into_iter()
            .filter(|rental| seen.insert(rental.customer.national_id.clone()))
            .map(|rental| rental.customer)
            .collect())
    }
}

/// Produces the agreement or invoice document for a rental
pub trait DocumentPipeline: Send + Sync {
    /// Render the document and return a reference to it
    fn render(&self, rental: &Rental, kind: DocumentKind) -> Result<String, RentalError>;
}

/// Delivers customer notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), RentalError>;
}

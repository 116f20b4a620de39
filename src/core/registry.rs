//! Thread-safe in-memory vehicle registry
//!
//! This module provides the `InMemoryVehicleRegistry` struct, which holds the
//! fleet in a `DashMap` keyed by vehicle id.
//!
//! # Thread Safety
//!
//! Every conditional update (`acquire`, `release`, `restore`) runs while
//! holding the DashMap write guard for that vehicle, so the status check and
//! the write happen as one step. Operations on different vehicles do not
//! block each other.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

use super::traits::VehicleRegistry;
use crate::types::{RentalError, RentalId, Vehicle, VehicleId, VehicleStatus, VehicleUpdate};

/// Fleet state shared across lifecycle operations
#[derive(Debug, Default)]
pub struct InMemoryVehicleRegistry {
    /// Concurrent map of vehicles by id
    vehicles: DashMap<VehicleId, Vehicle>,
}

impl InMemoryVehicleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            vehicles: DashMap::new(),
        }
    }

    /// Create a registry holding `vehicles`
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate id or invalid rate schedule.
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Result<Self, RentalError> {
        let registry = Self::new();
        for vehicle in vehicles {
            registry.register(vehicle)?;
        }
        Ok(registry)
    }

    /// Number of vehicles in the fleet
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the fleet is empty
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

impl VehicleRegistry for InMemoryVehicleRegistry {
    fn register(&self, vehicle: Vehicle) -> Result<(), RentalError> {
        vehicle.rates.validate()?;
        if vehicle.current_mileage < Decimal::ZERO {
            return Err(RentalError::negative_amount(
                "current_mileage",
                vehicle.current_mileage,
            ));
        }

        match self.vehicles.entry(vehicle.id) {
            Entry::Occupied(_) => Err(RentalError::duplicate_vehicle(vehicle.id)),
            Entry::Vacant(slot) => {
                slot.insert(vehicle);
                Ok(())
            }
        }
    }

    fn find(&self, id: VehicleId) -> Result<Option<Vehicle>, RentalError> {
        Ok(self.vehicles.get(&id).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> Result<Vec<Vehicle>, RentalError> {
        let mut vehicles: Vec<Vehicle> = self
            .vehicles
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        vehicles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(vehicles)
    }

    fn update_details(&self, id: VehicleId, update: VehicleUpdate) -> Result<Vehicle, RentalError> {
        if let Some(rates) = &update.rates {
            rates.validate()?;
        }
        if let Some(mileage) = update.current_mileage {
            if mileage < Decimal::ZERO {
                return Err(RentalError::negative_amount("current_mileage", mileage));
            }
        }

        let mut vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| RentalError::vehicle_not_found(id))?;

        if let Some(name) = update.name {
            vehicle.name = name;
        }
        if let Some(plate_number) = update.plate_number {
            vehicle.plate_number = plate_number;
        }
        if let Some(mileage) = update.current_mileage {
            vehicle.current_mileage = mileage;
        }
        if let Some(rates) = update.rates {
            vehicle.rates = rates;
        }

        Ok(vehicle.clone())
    }

    fn remove(&self, id: VehicleId) -> Result<Vehicle, RentalError> {
        if let Some((_, vehicle)) = self
            .vehicles
            .remove_if(&id, |_, vehicle| vehicle.status != VehicleStatus::Rented)
        {
            return Ok(vehicle);
        }

        if self.vehicles.contains_key(&id) {
            Err(RentalError::vehicle_in_use(id))
        } else {
            Err(RentalError::vehicle_not_found(id))
        }
    }

    fn acquire(
        &self,
        id: VehicleId,
        rental: RentalId,
        start_mileage: Decimal,
    ) -> Result<Vehicle, RentalError> {
        let mut vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| RentalError::vehicle_not_found(id))?;

        if !vehicle.is_available() {
            return Err(RentalError::vehicle_unavailable(id));
        }

        let previous = vehicle.clone();
        vehicle.status = VehicleStatus::Rented;
        vehicle.current_rental = Some(rental);
        vehicle.current_mileage = start_mileage;

        Ok(previous)
    }

    fn release(
        &self,
        id: VehicleId,
        rental: RentalId,
        end_mileage: Decimal,
    ) -> Result<Vehicle, RentalError> {
        let mut vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| RentalError::vehicle_not_found(id))?;

        if vehicle.status != VehicleStatus::Rented || vehicle.current_rental != Some(rental) {
            return Err(RentalError::vehicle_not_held(id, rental));
        }

        vehicle.status = VehicleStatus::Available;
        vehicle.current_rental = None;
        vehicle.current_mileage = end_mileage;

        Ok(vehicle.clone())
    }

    fn restore(&self, previous: &Vehicle, rental: RentalId) -> Result<(), RentalError> {
        let mut vehicle = self
            .vehicles
            .get_mut(&previous.id)
            .ok_or_else(|| RentalError::vehicle_not_found(previous.id))?;

        if vehicle.current_rental != Some(rental) {
            return Err(RentalError::vehicle_not_held(previous.id, rental));
        }

        *vehicle = previous.clone();
        Ok(())
    }
}

//! Rental lifecycle orchestration
//!
//! This module provides the `LifecycleController`, the only path by which a
//! rental is started or completed. It coordinates the vehicle registry and
//! the rental store, both injected as trait objects.
//!
//! # Architecture
//!
//! ```text
//! LifecycleController
//!     ├── Arc<dyn VehicleRegistry>           (vehicle status and mileage)
//!     ├── Arc<dyn RentalStore>               (rental records)
//!     ├── Option<Arc<dyn DocumentPipeline>>  (agreement and invoice rendering)
//!     ├── Option<Arc<dyn Notifier>>          (customer SMS)
//!     └── EngineConfig                       (late rounding, rate policy)
//! ```
//!
//! # Two-write transitions
//!
//! Starting and returning a rental each touch two records. They are written
//! in a fixed order and the first write is undone if the second fails:
//!
//! - start: acquire vehicle, then insert rental; on insert failure restore the vehicle
//! - return: complete rental, then release vehicle; on release failure reinstate the rental
//!
//! If the undo itself fails the caller receives
//! `RentalError::CompensationFailed` and the records need manual repair.
//!
//! # Post-commit dispatch
//!
//! Once a transition is committed the controller renders the document,
//! attaches its reference to the rental and notifies the customer. Failures
//! in these steps are returned as warnings on the [`Outcome`]; they never undo
//! the transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::calculator::CostCalculator;
use super::config::{EngineConfig, RatePolicy};
use super::traits::{DocumentPipeline, Notifier, RentalStore, VehicleRegistry};
use crate::types::{
    CostBreakdown, CostInput, DispatchStage, DocumentKind, JournalEvent, NewRental, Notification,
    Outcome, Rental, RentalError, RentalId, ReturnDetails, ReturnRental,
};

/// Starts and returns rentals against injected collaborators
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct LifecycleController {
    vehicles: Arc<dyn VehicleRegistry>,
    rentals: Arc<dyn RentalStore>,
    documents: Option<Arc<dyn DocumentPipeline>>,
    notifier: Option<Arc<dyn Notifier>>,
    calculator: CostCalculator,
    config: EngineConfig,
}

impl LifecycleController {
    /// Create a controller without document or notification dispatch
    pub fn new(
        vehicles: Arc<dyn VehicleRegistry>,
        rentals: Arc<dyn RentalStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            vehicles,
            rentals,
            documents: None,
            notifier: None,
            calculator: CostCalculator::new(config.late_rounding),
            config,
        }
    }

    /// Render agreements and invoices with `documents`
    pub fn with_documents(mut self, documents: Arc<dyn DocumentPipeline>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Notify customers through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn vehicles(&self) -> &Arc<dyn VehicleRegistry> {
        &self.vehicles
    }

    pub fn rentals(&self) -> &Arc<dyn RentalStore> {
        &self.rentals
    }

    /// Start a rental on an available vehicle
    ///
    /// # Errors
    ///
    /// * `RentalError::InvalidRentalDays` / `NegativeAmount` - invalid terms
    /// * `RentalError::DuplicateRental` - the rental id is already used
    /// * `RentalError::VehicleNotFound` - unknown vehicle
    /// * `RentalError::VehicleUnavailable` - the vehicle is already rented
    /// * `RentalError::CompensationFailed` - the insert failed and the vehicle could not be restored
    pub fn start_rental(&self, request: NewRental) -> Result<Outcome<Rental>, RentalError> {
        validate_new_rental(&request)?;

        let id = request.id;
        if self.rentals.find(id)?.is_some() {
            return Err(RentalError::duplicate_rental(id));
        }

        let previous = self
            .vehicles
            .acquire(request.vehicle, id, request.start_mileage)?;
        let rental = Rental::open(request, &previous);

        if let Err(insert_error) = self.rentals.insert(rental.clone()) {
            warn!(rental = id, vehicle = previous.id, error = %insert_error, "Rental insert failed, restoring vehicle");
            if let Err(restore_error) = self.vehicles.restore(&previous, id) {
                error!(rental = id, vehicle = previous.id, error = %restore_error, "Vehicle restore failed");
                return Err(RentalError::compensation_failed("start_rental", &restore_error));
            }
            return Err(insert_error);
        }

        info!(rental = id, vehicle = rental.vehicle, days = rental.rental_days, "Rental started");
        Ok(self.dispatch(rental, DocumentKind::Agreement))
    }

    /// Compute what a return would cost without writing anything
    pub fn quote_return(
        &self,
        id: RentalId,
        end_mileage: Decimal,
        returned_at: DateTime<Utc>,
        damage_cost: Decimal,
    ) -> Result<CostBreakdown, RentalError> {
        let rental = self.rentals.get(id)?;
        self.bill(&rental, end_mileage, returned_at, damage_cost)
    }

    /// Return an active rental, billing it and freeing its vehicle
    ///
    /// # Errors
    ///
    /// * `RentalError::RentalNotFound` - unknown rental
    /// * `RentalError::RentalNotActive` - the rental was already returned
    /// * `RentalError::VehicleMismatch` - the request names a different vehicle
    /// * any calculator error, in which case nothing is written
    /// * the release error, after the rental was reinstated
    /// * `RentalError::CompensationFailed` - the release failed and the rental could not be reinstated
    pub fn return_rental(&self, request: ReturnRental) -> Result<Outcome<Rental>, RentalError> {
        let id = request.id;
        let rental = self.rentals.get(id)?;

        if !rental.is_active() {
            return Err(RentalError::rental_not_active(id));
        }
        if rental.vehicle != request.vehicle {
            return Err(RentalError::vehicle_mismatch(id, rental.vehicle, request.vehicle));
        }

        let breakdown = self.bill(
            &rental,
            request.end_mileage,
            request.returned_at,
            request.damage_cost,
        )?;
        debug!(rental = id, due = %breakdown.final_balance_due, late_hours = breakdown.late_hours, "Return billed");

        let details = ReturnDetails {
            end_mileage: request.end_mileage,
            returned_at: request.returned_at,
            breakdown,
            signature: request.signature,
            remarks: request.remarks,
        };
        let completed = self.rentals.complete(id, details)?;

        if let Err(release_error) =
            self.vehicles
                .release(rental.vehicle, id, request.end_mileage)
        {
            warn!(rental = id, vehicle = rental.vehicle, error = %release_error, "Vehicle release failed, reinstating rental");
            if let Err(reinstate_error) = self.rentals.reinstate(id) {
                error!(rental = id, vehicle = rental.vehicle, error = %reinstate_error, "Rental reinstate failed");
                return Err(RentalError::compensation_failed("return_rental", &reinstate_error));
            }
            return Err(release_error);
        }

        info!(rental = id, vehicle = rental.vehicle, "Rental completed");
        Ok(self.dispatch(completed, DocumentKind::Invoice))
    }

    /// Apply one journal event
    pub fn apply(&self, event: JournalEvent) -> Result<Outcome<Rental>, RentalError> {
        match event {
            JournalEvent::Start(request) => self.start_rental(request),
            JournalEvent::Return(request) => self.return_rental(request),
        }
    }

    fn bill(
        &self,
        rental: &Rental,
        end_mileage: Decimal,
        returned_at: DateTime<Utc>,
        damage_cost: Decimal,
    ) -> Result<CostBreakdown, RentalError> {
        let rates = match self.config.rate_policy {
            RatePolicy::Snapshot => rental.rates.clone(),
            RatePolicy::Live => self.vehicles.get(rental.vehicle)?.rates,
        };

        self.calculator.calculate(&CostInput {
            rental_days: rental.rental_days,
            rates,
            start_mileage: rental.start_mileage,
            end_mileage,
            started_at: rental.started_at,
            returned_at,
            advance_payment: rental.advance_payment,
            damage_cost,
        })
    }

    fn dispatch(&self, rental: Rental, kind: DocumentKind) -> Outcome<Rental> {
        let mut outcome = Outcome::new(rental);
        let Some(documents) = &self.documents else {
            return outcome;
        };
        let id = outcome.value.id;

        let reference = match documents.render(&outcome.value, kind) {
            Ok(reference) => reference,
            Err(e) => {
                warn!(rental = id, %kind, error = %e, "Document generation failed");
                outcome.warn(DispatchStage::Document, e);
                return outcome;
            }
        };

        match self.rentals.attach_document(id, kind, &reference) {
            Ok(()) => match kind {
                DocumentKind::Agreement => outcome.value.agreement_url = Some(reference.clone()),
                DocumentKind::Invoice => outcome.value.invoice_url = Some(reference.clone()),
            },
            Err(e) => {
                warn!(rental = id, %kind, error = %e, "Document reference not saved");
                outcome.warn(DispatchStage::DocumentLink, e);
            }
        }

        if let Some(notifier) = &self.notifier {
            let notification = Notification::for_rental(&outcome.value, kind, reference);
            if let Err(e) = notifier.notify(&notification) {
                warn!(rental = id, %kind, error = %e, "Customer notification failed");
                outcome.warn(DispatchStage::Notification, e);
            }
        }

        outcome
    }
}

fn validate_new_rental(request: &NewRental) -> Result<(), RentalError> {
    if request.rental_days < 1 {
        return Err(RentalError::invalid_rental_days(request.rental_days));
    }
    if request.start_mileage < Decimal::ZERO {
        return Err(RentalError::negative_amount(
            "start_mileage",
            request.start_mileage,
        ));
    }
    if request.advance_payment < Decimal::ZERO {
        return Err(RentalError::negative_amount(
            "advance_payment",
            request.advance_payment,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LateHourRounding;
    use crate::core::registry::InMemoryVehicleRegistry;
    use crate::core::rental_store::InMemoryRentalStore;
    use crate::types::{
        CustomerDetails, RateSchedule, RentalStatus, Vehicle, VehicleId, VehicleStatus,
        VehicleUpdate,
    };
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use std::sync::Mutex;
    use std::thread;

    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn rates() -> RateSchedule {
        RateSchedule::new(
            Decimal::from(5000),
            Some(100),
            Decimal::from(20),
            Decimal::from(100),
        )
    }

    fn registry() -> Arc<InMemoryVehicleRegistry> {
        Arc::new(
            InMemoryVehicleRegistry::with_vehicles([
                Vehicle::new(1, "Toyota Aqua", "CAB-1234", Decimal::from(1000), rates()),
                Vehicle::new(2, "Honda Fit", "CAD-5678", Decimal::from(5000), rates()),
            ])
            .unwrap(),
        )
    }

    fn controller() -> LifecycleController {
        LifecycleController::new(
            registry(),
            Arc::new(InMemoryRentalStore::new()),
            EngineConfig::default(),
        )
    }

    fn new_rental(id: RentalId, vehicle: VehicleId) -> NewRental {
        NewRental {
            id,
            vehicle,
            customer: CustomerDetails {
                name: "Nimal Perera".to_string(),
                national_id: "901234567V".to_string(),
                phone: "0771234567".to_string(),
                address: "12 Galle Road, Colombo".to_string(),
            },
            rental_days: 3,
            start_mileage: Decimal::from(1000),
            advance_payment: Decimal::from(3000),
            started_at: started_at(),
            signature: "signatures/start-1.png".to_string(),
            remarks: None,
        }
    }

    fn return_request(id: RentalId, vehicle: VehicleId, end_mileage: i64) -> ReturnRental {
        ReturnRental {
            id,
            vehicle,
            end_mileage: Decimal::from(end_mileage),
            returned_at: started_at() + Duration::days(3),
            damage_cost: Decimal::ZERO,
            signature: "signatures/return-1.png".to_string(),
            remarks: Some("Clean".to_string()),
        }
    }

    /// Documents rendered to a fixed reference
    struct StaticDocuments;

    impl DocumentPipeline for StaticDocuments {
        fn render(&self, rental: &Rental, kind: DocumentKind) -> Result<String, RentalError> {
            Ok(format!("docs/{}-{}.txt", kind, rental.id))
        }
    }

    struct FailingDocuments;

    impl DocumentPipeline for FailingDocuments {
        fn render(&self, _rental: &Rental, _kind: DocumentKind) -> Result<String, RentalError> {
            Err(RentalError::document_failed("disk full"))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: &Notification) -> Result<(), RentalError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _notification: &Notification) -> Result<(), RentalError> {
            Err(RentalError::notification_failed("gateway timeout"))
        }
    }

    /// Rental store whose inserts or reinstates fail on demand
    #[derive(Default)]
    struct FlakyRentalStore {
        inner: InMemoryRentalStore,
        fail_insert: bool,
        fail_reinstate: bool,
    }

    impl RentalStore for FlakyRentalStore {
        fn insert(&self, rental: Rental) -> Result<(), RentalError> {
            if self.fail_insert {
                return Err(RentalError::storage("insert rejected"));
            }
            self.inner.insert(rental)
        }

        fn find(&self, id: RentalId) -> Result<Option<Rental>, RentalError> {
            self.inner.find(id)
        }

        fn list(&self) -> Result<Vec<Rental>, RentalError> {
            self.inner.list()
        }

        fn complete(&self, id: RentalId, details: ReturnDetails) -> Result<Rental, RentalError> {
            self.inner.complete(id, details)
        }

        fn reinstate(&self, id: RentalId) -> Result<Rental, RentalError> {
            if self.fail_reinstate {
                return Err(RentalError::storage("reinstate rejected"));
            }
            self.inner.reinstate(id)
        }

        fn attach_document(
            &self,
            id: RentalId,
            kind: DocumentKind,
            reference: &str,
        ) -> Result<(), RentalError> {
            self.inner.attach_document(id, kind, reference)
        }
    }

    /// Registry whose releases or restores fail on demand
    #[derive(Default)]
    struct FlakyRegistry {
        inner: InMemoryVehicleRegistry,
        fail_release: bool,
        fail_restore: bool,
    }

    impl VehicleRegistry for FlakyRegistry {
        fn register(&self, vehicle: Vehicle) -> Result<(), RentalError> {
            self.inner.register(vehicle)
        }

        fn find(&self, id: VehicleId) -> Result<Option<Vehicle>, RentalError> {
            self.inner.find(id)
        }

        fn list(&self) -> Result<Vec<Vehicle>, RentalError> {
            self.inner.list()
        }

        fn update_details(
            &self,
            id: VehicleId,
            update: VehicleUpdate,
        ) -> Result<Vehicle, RentalError> {
            self.inner.update_details(id, update)
        }

        fn remove(&self, id: VehicleId) -> Result<Vehicle, RentalError> {
            self.inner.remove(id)
        }

        fn acquire(
            &self,
            id: VehicleId,
            rental: RentalId,
            start_mileage: Decimal,
        ) -> Result<Vehicle, RentalError> {
            self.inner.acquire(id, rental, start_mileage)
        }

        fn release(
            &self,
            id: VehicleId,
            rental: RentalId,
            end_mileage: Decimal,
        ) -> Result<Vehicle, RentalError> {
            if self.fail_release {
                return Err(RentalError::storage("release rejected"));
            }
            self.inner.release(id, rental, end_mileage)
        }

        fn restore(&self, previous: &Vehicle, rental: RentalId) -> Result<(), RentalError> {
            if self.fail_restore {
                return Err(RentalError::storage("restore rejected"));
            }
            self.inner.restore(previous, rental)
        }
    }

    fn flaky_registry(fail_release: bool, fail_restore: bool) -> Arc<FlakyRegistry> {
        let registry = FlakyRegistry {
            fail_release,
            fail_restore,
            ..FlakyRegistry::default()
        };
        registry
            .register(Vehicle::new(1, "Toyota Aqua", "CAB-1234", Decimal::from(1000), rates()))
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_start_rental_marks_vehicle_rented() {
        let controller = controller();

        let outcome = controller.start_rental(new_rental(1, 1)).unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.value.status(), RentalStatus::Active);
        assert_eq!(outcome.value.rates, rates());
        assert_eq!(outcome.value.vehicle_name, "Toyota Aqua");
        assert_eq!(outcome.value.agreement_url, None);

        let vehicle = controller.vehicles().get(1).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Rented);
        assert_eq!(vehicle.current_rental, Some(1));
        assert_eq!(vehicle.current_mileage, Decimal::from(1000));
        assert_eq!(controller.rentals().get(1).unwrap(), outcome.value);
    }

    #[test]
    fn test_start_rental_on_rented_vehicle() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();

        let result = controller.start_rental(new_rental(2, 1));

        assert_eq!(result, Err(RentalError::vehicle_unavailable(1)));
        assert_eq!(controller.rentals().find(2).unwrap(), None);
    }

    #[test]
    fn test_start_rental_duplicate_id_leaves_vehicle_untouched() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();

        let result = controller.start_rental(new_rental(1, 2));

        assert_eq!(result, Err(RentalError::duplicate_rental(1)));
        assert!(controller.vehicles().get(2).unwrap().is_available());
    }

    #[rstest]
    #[case::zero_days(0, 1000, 3000, RentalError::invalid_rental_days(0))]
    #[case::negative_mileage(3, -1, 3000, RentalError::negative_amount("start_mileage", Decimal::from(-1)))]
    #[case::negative_advance(3, 1000, -5, RentalError::negative_amount("advance_payment", Decimal::from(-5)))]
    fn test_start_rental_validation(
        #[case] days: u32,
        #[case] mileage: i64,
        #[case] advance: i64,
        #[case] expected: RentalError,
    ) {
        let controller = controller();
        let mut request = new_rental(1, 1);
        request.rental_days = days;
        request.start_mileage = Decimal::from(mileage);
        request.advance_payment = Decimal::from(advance);

        assert_eq!(controller.start_rental(request), Err(expected));
        assert!(controller.vehicles().get(1).unwrap().is_available());
    }

    #[test]
    fn test_start_rental_insert_failure_restores_vehicle() {
        let registry = registry();
        let rentals = Arc::new(FlakyRentalStore {
            fail_insert: true,
            ..FlakyRentalStore::default()
        });
        let controller = LifecycleController::new(registry.clone(), rentals, EngineConfig::default());
        let mut request = new_rental(1, 1);
        request.start_mileage = Decimal::from(1100);

        let result = controller.start_rental(request);

        assert_eq!(result, Err(RentalError::storage("insert rejected")));
        let vehicle = registry.get(1).unwrap();
        assert!(vehicle.is_available());
        assert_eq!(vehicle.current_rental, None);
        assert_eq!(vehicle.current_mileage, Decimal::from(1000));
    }

    #[test]
    fn test_start_rental_failed_restore_reports_compensation_failure() {
        let rentals = Arc::new(FlakyRentalStore {
            fail_insert: true,
            ..FlakyRentalStore::default()
        });
        let controller =
            LifecycleController::new(flaky_registry(false, true), rentals, EngineConfig::default());

        let result = controller.start_rental(new_rental(1, 1));

        assert!(matches!(result, Err(RentalError::CompensationFailed { .. })));
    }

    #[test]
    fn test_return_rental_on_time() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();

        let outcome = controller.return_rental(return_request(1, 1, 1250)).unwrap();

        let rental = outcome.value;
        assert_eq!(rental.status(), RentalStatus::Completed);
        let details = rental.return_details().unwrap();
        assert_eq!(details.final_total_cost(), Decimal::from(12000));
        assert_eq!(details.extra_mileage_cost(), Decimal::ZERO);
        assert_eq!(details.breakdown.late_hours, 0);
        assert_eq!(details.remarks.as_deref(), Some("Clean"));

        let vehicle = controller.vehicles().get(1).unwrap();
        assert!(vehicle.is_available());
        assert_eq!(vehicle.current_mileage, Decimal::from(1250));
        assert_eq!(vehicle.current_rental, None);
    }

    #[test]
    fn test_return_rental_late_with_overage_and_damage() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();
        let mut request = return_request(1, 1, 1400);
        request.returned_at = started_at() + Duration::days(3) + Duration::minutes(190);
        request.damage_cost = Decimal::from(1500);

        let outcome = controller.return_rental(request).unwrap();

        let breakdown = &outcome.value.return_details().unwrap().breakdown;
        assert_eq!(breakdown.extra_km_cost, Decimal::from(2000));
        assert_eq!(breakdown.late_hours, 4);
        assert_eq!(breakdown.late_fee_cost, Decimal::from(400));
        assert_eq!(breakdown.final_balance_due, Decimal::from(15900));
    }

    #[test]
    fn test_return_with_lower_mileage_changes_nothing() {
        let controller = controller();
        let started = controller.start_rental(new_rental(1, 1)).unwrap().value;

        let result = controller.return_rental(return_request(1, 1, 900));

        assert!(matches!(result, Err(RentalError::MileageDecreased { .. })));
        assert_eq!(controller.rentals().get(1).unwrap(), started);
        assert_eq!(
            controller.vehicles().get(1).unwrap().status,
            VehicleStatus::Rented
        );
    }

    #[test]
    fn test_second_return_is_conflict() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();
        let first = controller.return_rental(return_request(1, 1, 1250)).unwrap();

        let second = controller.return_rental(return_request(1, 1, 1600));

        assert_eq!(second, Err(RentalError::rental_not_active(1)));
        assert_eq!(controller.rentals().get(1).unwrap(), first.value);
    }

    #[test]
    fn test_return_with_wrong_vehicle() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();

        let result = controller.return_rental(return_request(1, 2, 1250));

        assert_eq!(result, Err(RentalError::vehicle_mismatch(1, 1, 2)));
    }

    #[test]
    fn test_return_unknown_rental() {
        let result = controller().return_rental(return_request(7, 1, 1250));

        assert_eq!(result, Err(RentalError::rental_not_found(7)));
    }

    #[test]
    fn test_release_failure_reinstates_rental() {
        let rentals = Arc::new(InMemoryRentalStore::new());
        let controller = LifecycleController::new(
            flaky_registry(true, false),
            rentals.clone(),
            EngineConfig::default(),
        );
        controller.start_rental(new_rental(1, 1)).unwrap();

        let result = controller.return_rental(return_request(1, 1, 1250));

        assert_eq!(result, Err(RentalError::storage("release rejected")));
        let rental = rentals.get(1).unwrap();
        assert!(rental.is_active());
        assert_eq!(rental.return_details(), None);
    }

    #[test]
    fn test_release_and_reinstate_failure_reports_compensation_failure() {
        let rentals = Arc::new(FlakyRentalStore {
            fail_reinstate: true,
            ..FlakyRentalStore::default()
        });
        let controller =
            LifecycleController::new(flaky_registry(true, false), rentals, EngineConfig::default());
        controller.start_rental(new_rental(1, 1)).unwrap();

        let result = controller.return_rental(return_request(1, 1, 1250));

        assert_eq!(
            result,
            Err(RentalError::compensation_failed(
                "return_rental",
                &RentalError::storage("reinstate rejected")
            ))
        );
    }

    #[rstest]
    #[case::snapshot(RatePolicy::Snapshot, 12000)]
    #[case::live(RatePolicy::Live, 15000)]
    fn test_rate_policy(#[case] policy: RatePolicy, #[case] expected_due: i64) {
        let controller = LifecycleController::new(
            registry(),
            Arc::new(InMemoryRentalStore::new()),
            EngineConfig::new(LateHourRounding::Ceil, policy),
        );
        controller.start_rental(new_rental(1, 1)).unwrap();
        controller
            .vehicles()
            .update_details(
                1,
                VehicleUpdate {
                    rates: Some(RateSchedule::new(
                        Decimal::from(6000),
                        Some(100),
                        Decimal::from(20),
                        Decimal::from(100),
                    )),
                    ..VehicleUpdate::default()
                },
            )
            .unwrap();

        let outcome = controller.return_rental(return_request(1, 1, 1250)).unwrap();

        assert_eq!(
            outcome.value.return_details().unwrap().final_total_cost(),
            Decimal::from(expected_due)
        );
    }

    #[test]
    fn test_apply_journal_events_in_order() {
        let controller = controller();

        let started = controller
            .apply(JournalEvent::Start(new_rental(1, 2)))
            .unwrap();
        let returned = controller
            .apply(JournalEvent::Return(return_request(1, 2, 1250)))
            .unwrap();

        assert!(started.value.is_active());
        assert_eq!(returned.value.status(), RentalStatus::Completed);
        assert!(controller.vehicles().get(2).unwrap().is_available());
    }

    #[test]
    fn test_quote_return_writes_nothing() {
        let controller = controller();
        let started = controller.start_rental(new_rental(1, 1)).unwrap().value;

        let quote = controller
            .quote_return(1, Decimal::from(1400), started_at() + Duration::days(3), Decimal::ZERO)
            .unwrap();

        assert_eq!(quote.final_balance_due, Decimal::from(14000));
        assert_eq!(controller.rentals().get(1).unwrap(), started);
    }

    #[test]
    fn test_dispatch_attaches_documents_and_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = controller()
            .with_documents(Arc::new(StaticDocuments))
            .with_notifier(notifier.clone());

        let started = controller.start_rental(new_rental(1, 1)).unwrap();
        let returned = controller.return_rental(return_request(1, 1, 1250)).unwrap();

        assert!(started.is_clean());
        assert!(returned.is_clean());
        assert_eq!(started.value.agreement_url.as_deref(), Some("docs/agreement-1.txt"));
        assert_eq!(returned.value.invoice_url.as_deref(), Some("docs/invoice-1.txt"));
        assert_eq!(controller.rentals().get(1).unwrap(), returned.value);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, DocumentKind::Agreement);
        assert_eq!(sent[1].link, "docs/invoice-1.txt");
        assert_eq!(sent[1].customer_phone, "0771234567");
    }

    #[test]
    fn test_notification_failure_is_warning() {
        let controller = controller()
            .with_documents(Arc::new(StaticDocuments))
            .with_notifier(Arc::new(FailingNotifier));

        let outcome = controller.start_rental(new_rental(1, 1)).unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].stage, DispatchStage::Notification);
        assert_eq!(
            outcome.value.agreement_url.as_deref(),
            Some("docs/agreement-1.txt")
        );
        assert!(controller.rentals().get(1).unwrap().is_active());
    }

    #[test]
    fn test_document_failure_skips_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = controller()
            .with_documents(Arc::new(FailingDocuments))
            .with_notifier(notifier.clone());
        controller.start_rental(new_rental(1, 1)).unwrap();

        let outcome = controller.return_rental(return_request(1, 1, 1250)).unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].stage, DispatchStage::Document);
        assert_eq!(outcome.value.status(), RentalStatus::Completed);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_starts_on_same_vehicle() {
        let controller = controller();
        let handles: Vec<_> = [1, 2]
            .into_iter()
            .map(|id| {
                let controller = controller.clone();
                thread::spawn(move || controller.start_rental(new_rental(id, 1)))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| *r == Err(RentalError::vehicle_unavailable(1))));
        assert_eq!(controller.rentals().list().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_returns_of_same_rental() {
        let controller = controller();
        controller.start_rental(new_rental(1, 1)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = controller.clone();
                thread::spawn(move || controller.return_rental(return_request(1, 1, 1250)))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == RentalError::rental_not_active(1)));
        assert!(controller.vehicles().get(1).unwrap().is_available());
    }
}

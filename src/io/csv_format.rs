//! CSV format handling for fleet, journal and ledger files
//!
//! This module centralizes all CSV format concerns, providing:
//! - `FleetCsvRecord` and `EventCsvRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Ledger and fleet output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    format_money, CustomerDetails, JournalEvent, NewRental, RateSchedule, Rental, RentalId,
    ReturnRental, Vehicle, VehicleId, VehicleStatus,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Fleet CSV record structure for deserialization
///
/// Columns: id, name, plate, status, mileage, daily_rate, km_limit_per_day,
/// extra_km_price, late_fee_per_hour. Older exports name the last two
/// columns `extra_mileage_rate` and `extra_hourly_rate`; both are read into
/// the canonical fields.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FleetCsvRecord {
    pub id: VehicleId,
    pub name: String,
    pub plate: String,
    pub status: Option<String>,
    pub mileage: String,
    pub daily_rate: String,
    pub km_limit_per_day: Option<String>,
    #[serde(alias = "extra_mileage_rate")]
    pub extra_km_price: String,
    #[serde(alias = "extra_hourly_rate")]
    pub late_fee_per_hour: String,
}

/// Journal CSV record structure for deserialization
///
/// Columns: type, rental, vehicle, timestamp, days, mileage, advance, damage,
/// customer, national_id, phone, address, signature, remarks. Which columns
/// are required depends on the event type.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct EventCsvRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub rental: RentalId,
    pub vehicle: VehicleId,
    pub timestamp: String,
    pub days: Option<String>,
    pub mileage: String,
    pub advance: Option<String>,
    pub damage: Option<String>,
    pub customer: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub signature: Option<String>,
    pub remarks: Option<String>,
}

/// Convert a FleetCsvRecord to a Vehicle
///
/// # Returns
///
/// * `Ok(Vehicle)` - Successfully converted vehicle
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_fleet_record(record: FleetCsvRecord) -> Result<Vehicle, String> {
    let context = format!("vehicle {}", record.id);

    let status = match record
        .status
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("") | Some("available") => VehicleStatus::Available,
        Some("rented") => VehicleStatus::Rented,
        Some(other) => return Err(format!("Invalid status '{}' for {}", other, context)),
    };

    let km_limit_per_day = match non_empty(record.km_limit_per_day) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| format!("Invalid km_limit_per_day '{}' for {}", raw, context))?,
        ),
        None => None,
    };

    let rates = RateSchedule::new(
        parse_decimal("daily_rate", &record.daily_rate, &context)?,
        km_limit_per_day,
        parse_decimal("extra_km_price", &record.extra_km_price, &context)?,
        parse_decimal("late_fee_per_hour", &record.late_fee_per_hour, &context)?,
    );

    let mut vehicle = Vehicle::new(
        record.id,
        record.name,
        record.plate,
        parse_decimal("mileage", &record.mileage, &context)?,
        rates,
    );
    vehicle.status = status;

    Ok(vehicle)
}

/// Convert an EventCsvRecord to a JournalEvent
///
/// This function:
/// - Parses the event type (`start` or `return`, case-insensitive)
/// - Parses the timestamp as RFC 3339, or `YYYY-MM-DD HH:MM:SS` in UTC
/// - Requires `days`, `customer` and `signature` for a start
/// - Requires `signature` for a return
/// - Defaults an absent advance or damage to zero
///
/// # Returns
///
/// * `Ok(JournalEvent)` - Successfully converted event
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_event_record(record: EventCsvRecord) -> Result<JournalEvent, String> {
    let context = format!("rental {}", record.rental);
    let event_type = record.event_type.to_lowercase();

    if event_type != "start" && event_type != "return" {
        return Err(format!(
            "Invalid event type: '{}' for {}",
            record.event_type, context
        ));
    }

    let timestamp = parse_timestamp(&record.timestamp, &context)?;
    let mileage = parse_decimal("mileage", &record.mileage, &context)?;
    let signature = non_empty(record.signature)
        .ok_or_else(|| format!("{} event for {} requires a signature", event_type, context))?;
    let remarks = non_empty(record.remarks);

    if event_type == "return" {
        let damage_cost = match non_empty(record.damage) {
            Some(raw) => parse_decimal("damage", &raw, &context)?,
            None => Decimal::ZERO,
        };

        return Ok(JournalEvent::Return(ReturnRental {
            id: record.rental,
            vehicle: record.vehicle,
            end_mileage: mileage,
            returned_at: timestamp,
            damage_cost,
            signature,
            remarks,
        }));
    }

    let days = non_empty(record.days)
        .ok_or_else(|| format!("start event for {} requires days", context))?;
    let rental_days = days
        .parse::<u32>()
        .map_err(|_| format!("Invalid days '{}' for {}", days, context))?;
    let advance_payment = match non_empty(record.advance) {
        Some(raw) => parse_decimal("advance", &raw, &context)?,
        None => Decimal::ZERO,
    };
    let name = non_empty(record.customer)
        .ok_or_else(|| format!("start event for {} requires a customer", context))?;

    Ok(JournalEvent::Start(NewRental {
        id: record.rental,
        vehicle: record.vehicle,
        customer: CustomerDetails {
            name,
            national_id: record.national_id.unwrap_or_default(),
            phone: record.phone.unwrap_or_default(),
            address: record.address.unwrap_or_default(),
        },
        rental_days,
        start_mileage: mileage,
        advance_payment,
        started_at: timestamp,
        signature,
        remarks,
    }))
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_decimal(field: &str, raw: &str, context: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim())
        .map_err(|_| format!("Invalid {} '{}' for {}", field, raw, context))
}

fn parse_timestamp(raw: &str, context: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("Invalid timestamp '{}' for {}", raw, context))
}

/// Write the rental ledger to CSV format
///
/// Writes one row per rental, sorted by rental id. Active rentals leave the
/// return columns empty. Money columns are rounded to two decimal places.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_rentals_csv(rentals: &[Rental], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "rental",
            "vehicle",
            "status",
            "days",
            "start_mileage",
            "end_mileage",
            "advance",
            "base_cost",
            "extra_km",
            "extra_km_cost",
            "late_hours",
            "late_fee_cost",
            "damage_cost",
            "final_balance_due",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_rentals = rentals.to_vec();
    sorted_rentals.sort_by_key(|rental| rental.id);

    for rental in sorted_rentals {
        let returned = match rental.return_details() {
            Some(details) => {
                let breakdown = &details.breakdown;
                vec![
                    details.end_mileage.to_string(),
                    format_money(rental.advance_payment),
                    format_money(breakdown.base_cost),
                    breakdown.extra_km.to_string(),
                    format_money(breakdown.extra_km_cost),
                    breakdown.late_hours.to_string(),
                    format_money(breakdown.late_fee_cost),
                    format_money(breakdown.damage_cost),
                    format_money(breakdown.final_balance_due),
                ]
            }
            None => {
                let mut empty = vec![String::new(); 9];
                empty[1] = format_money(rental.advance_payment);
                empty
            }
        };

        let mut row = vec![
            rental.id.to_string(),
            rental.vehicle.to_string(),
            rental.status().to_string(),
            rental.rental_days.to_string(),
            rental.start_mileage.to_string(),
        ];
        row.extend(returned);

        writer
            .write_record(&row)
            .map_err(|e| format!("Failed to write rental record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write fleet state to CSV format
///
/// Writes vehicles sorted by id with columns: vehicle, status, mileage, rental
pub fn write_vehicles_csv(vehicles: &[Vehicle], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["vehicle", "status", "mileage", "rental"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_vehicles = vehicles.to_vec();
    sorted_vehicles.sort_by_key(|vehicle| vehicle.id);

    for vehicle in sorted_vehicles {
        writer
            .write_record(&[
                vehicle.id.to_string(),
                vehicle.status.to_string(),
                vehicle.current_mileage.to_string(),
                vehicle
                    .current_rental
                    .map(|rental| rental.to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write vehicle record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write the short link table to CSV format
///
/// Columns: id, long_url
pub fn write_short_links_csv(
    links: &[(String, String)],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["id", "long_url"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (id, long_url) in links {
        writer
            .write_record([id, long_url])
            .map_err(|e| format!("Failed to write short link record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

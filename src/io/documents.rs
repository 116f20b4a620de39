//! Plain-text agreement and invoice rendering
//!
//! `TextDocumentRenderer` writes one text file per document into a
//! directory and returns the file path as the document reference.

use crate::core::DocumentPipeline;
use crate::types::{format_money, DocumentKind, Rental, RentalError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Writes agreements and invoices as text files
///
/// `render` uses blocking `std::fs` writes. The batch processor applies
/// events on tokio's blocking pool, so the renderer never runs on an async
/// worker thread.
#[derive(Debug, Clone)]
pub struct TextDocumentRenderer {
    dir: PathBuf,
}

impl TextDocumentRenderer {
    /// Render into `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RentalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentPipeline for TextDocumentRenderer {
    fn render(&self, rental: &Rental, kind: DocumentKind) -> Result<String, RentalError> {
        let body = match kind {
            DocumentKind::Agreement => agreement_text(rental),
            DocumentKind::Invoice => invoice_text(rental)?,
        };

        let path = self.dir.join(format!("{}-{}.txt", kind, rental.id));
        fs::write(&path, body).map_err(|e| {
            RentalError::document_failed(format!("cannot write {}: {}", path.display(), e))
        })?;

        Ok(path.display().to_string())
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Text of the rental agreement signed at start
pub fn agreement_text(rental: &Rental) -> String {
    let rates = &rental.rates;
    let mut lines = vec![
        format!("RENTAL AGREEMENT #{}", rental.id),
        String::new(),
        format!("Vehicle:           {} ({})", rental.vehicle_name, rental.vehicle_plate),
        format!("Customer:          {}", rental.customer.name),
        format!("National ID:       {}", rental.customer.national_id),
        format!("Phone:             {}", rental.customer.phone),
        format!("Address:           {}", rental.customer.address),
        String::new(),
        format!("Start:             {}", timestamp(rental.started_at)),
        format!("Rental days:       {}", rental.rental_days),
        format!("Start mileage:     {} km", rental.start_mileage),
        format!("Daily rate:        {}", format_money(rates.daily_rate)),
        format!("Km limit per day:  {} km", rates.effective_km_limit()),
        format!("Extra km price:    {}", format_money(rates.extra_km_price)),
        format!("Late fee per hour: {}", format_money(rates.late_fee_per_hour)),
        format!("Advance payment:   {}", format_money(rental.advance_payment)),
    ];
    if let Some(remarks) = &rental.remarks {
        lines.push(format!("Remarks:           {}", remarks));
    }
    lines.push(String::new());
    lines.push(format!("Signature:         {}", rental.signature));

    lines.join("\n") + "\n"
}

/// Text of the itemised invoice issued at return
///
/// Mileage, late fee and damage lines only appear when non-zero.
pub fn invoice_text(rental: &Rental) -> Result<String, RentalError> {
    let details = rental.return_details().ok_or_else(|| {
        RentalError::document_failed(format!("rental {} has not been returned", rental.id))
    })?;
    let breakdown = &details.breakdown;
    let rates = &breakdown.rates;

    let mut lines = vec![
        format!("INVOICE #{}", rental.id),
        String::new(),
        format!("Vehicle:  {} ({})", rental.vehicle_name, rental.vehicle_plate),
        format!("Customer: {}", rental.customer.name),
        format!("Started:  {}", timestamp(rental.started_at)),
        format!("Due back: {}", timestamp(breakdown.planned_return)),
        format!("Returned: {}", timestamp(details.returned_at)),
        format!(
            "Mileage:  {} -> {} ({} km driven, {} km included)",
            rental.start_mileage,
            details.end_mileage,
            breakdown.distance_driven,
            breakdown.allowed_distance
        ),
        String::new(),
        format!(
            "Base charge ({} days x {}): {}",
            breakdown.rental_days,
            format_money(rates.daily_rate),
            format_money(breakdown.base_cost)
        ),
    ];
    if breakdown.extra_km_cost != Decimal::ZERO {
        lines.push(format!(
            "Extra mileage ({} km x {}): {}",
            breakdown.extra_km,
            format_money(rates.extra_km_price),
            format_money(breakdown.extra_km_cost)
        ));
    }
    if breakdown.late_fee_cost != Decimal::ZERO {
        lines.push(format!(
            "Late fee ({} h x {}): {}",
            breakdown.late_hours,
            format_money(rates.late_fee_per_hour),
            format_money(breakdown.late_fee_cost)
        ));
    }
    if breakdown.damage_cost != Decimal::ZERO {
        lines.push(format!(
            "Damage and repairs: {}",
            format_money(breakdown.damage_cost)
        ));
    }
    lines.push(format!("Subtotal: {}", format_money(breakdown.subtotal)));
    lines.push(format!(
        "Less advance: {}",
        format_money(breakdown.advance_payment)
    ));
    if breakdown.is_credit() {
        lines.push(format!(
            "Credit due to customer: {}",
            format_money(-breakdown.final_balance_due)
        ));
    } else {
        lines.push(format!(
            "Total due: {}",
            format_money(breakdown.final_balance_due)
        ));
    }
    if let Some(remarks) = &details.remarks {
        lines.push(format!("Remarks: {}", remarks));
    }
    lines.push(String::new());
    lines.push(format!("Signature: {}", details.signature));

    Ok(lines.join("\n") + "\n")
}

//! I/O module
//!
//! Handles CSV parsing and output, document files and the SMS outbox.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, ledger and fleet output)
//! - `sync_reader` - Fleet loader and synchronous journal reader with iterator interface
//! - `async_reader` - Asynchronous journal reader with batch reading interface
//! - `documents` - Plain-text agreement and invoice rendering
//! - `notification` - SMS composition and the CSV outbox notifier
//! - `short_links` - Short URLs for document links

pub mod async_reader;
pub mod csv_format;
pub mod documents;
pub mod notification;
pub mod short_links;
pub mod sync_reader;

pub use async_reader::AsyncJournalReader;
pub use csv_format::{
    convert_event_record, convert_fleet_record, write_rentals_csv, write_short_links_csv,
    write_vehicles_csv,
    EventCsvRecord, FleetCsvRecord,
};
pub use documents::TextDocumentRenderer;
pub use notification::{normalize_phone, CsvOutbox, SmsMessage};
pub use short_links::{InMemoryLinkShortener, LinkShortener};
pub use sync_reader::{read_fleet, JournalReader};

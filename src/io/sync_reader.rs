//! Synchronous CSV readers for fleet and journal files
//!
//! Provides a streaming iterator over journal events and a loader for the
//! fleet file. Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual journal rows that fail to parse are yielded as `Err` items
//! - A malformed fleet row fails the whole load, since every later event
//!   depends on the fleet
//! - Line numbers are included in error messages for debugging

use crate::io::csv_format::{
    convert_event_record, convert_fleet_record, EventCsvRecord, FleetCsvRecord,
};
use crate::types::{JournalEvent, Vehicle};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Load every vehicle from a fleet CSV file
///
/// # Errors
///
/// Returns an error naming the line of the first row that cannot be read or
/// converted.
pub fn read_fleet(path: &Path) -> Result<Vec<Vehicle>, String> {
    let mut reader = open_csv(path)?;
    let mut vehicles = Vec::new();

    for (index, result) in reader.deserialize::<FleetCsvRecord>().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let record = result.map_err(|e| format!("Fleet line {}: CSV parse error: {}", line, e))?;
        let vehicle =
            convert_fleet_record(record).map_err(|e| format!("Fleet line {}: {}", line, e))?;
        vehicles.push(vehicle);
    }

    Ok(vehicles)
}

/// Synchronous journal reader
///
/// Yields one `Result<JournalEvent, String>` per journal row, reading rows
/// one at a time.
#[derive(Debug)]
pub struct JournalReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl JournalReader {
    /// Open a journal CSV file for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields, allows short rows
    /// (trailing optional columns may be omitted) and uses an 8KB buffer.
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 0,
        })
    }
}

impl Iterator for JournalReader {
    type Item = Result<JournalEvent, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<EventCsvRecord>();

        let result = deserializer.next()?;
        self.line_num += 1;
        let line = self.line_num + 1;

        Some(match result {
            Ok(record) => convert_event_record(record).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

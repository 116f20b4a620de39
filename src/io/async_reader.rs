//! Asynchronous journal reader with batch interface
//!
//! Provides batch reading over journal events for the async strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncJournalReader → Batches of JournalEvents
//!                    ↓
//!             csv_format module
//!             (EventCsvRecord, convert_event_record)
//! ```

use crate::io::csv_format::{convert_event_record, EventCsvRecord};
use crate::types::JournalEvent;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous journal reader
///
/// Reads journal rows in batches. Rows that cannot be parsed are logged,
/// counted and skipped.
pub struct AsyncJournalReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncJournalReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` journal events
    ///
    /// Returns an empty vector once the end of the journal is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<JournalEvent> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<EventCsvRecord>();

        while batch.len() < batch_size {
            let Some(result) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match result {
                Ok(record) => match convert_event_record(record) {
                    Ok(event) => batch.push(event),
                    Err(e) => {
                        self.skipped += 1;
                        warn!(line, error = %e, "Skipping journal record");
                    }
                },
                Err(e) => {
                    self.skipped += 1;
                    warn!(line, error = %e, "Skipping unparseable journal row");
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

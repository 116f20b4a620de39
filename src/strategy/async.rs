//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. The journal is read in batches and each batch
//! is partitioned by vehicle before being applied.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncJournalReader (batch CSV reading)
//!     └── BatchProcessor (vehicle partitioning + tokio tasks)
//!         └── LifecycleController (shared with the ReplaySession)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another, so a vehicle's events keep
//!   file order across batch boundaries
//! - Within a batch, each vehicle's events run sequentially in one task and
//!   different vehicles run in parallel

use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncJournalReader;
use crate::strategy::{ProcessingStrategy, ReplayReport, ReplaySession};
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, warn};

/// Configuration for batch processing
///
/// Controls how journal events are batched and the number of worker threads
/// used within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of journal events per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Builds its own multi-threaded tokio runtime per call, so it can be used
/// from synchronous code.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, session: &ReplaySession, journal: &Path) -> Result<ReplayReport, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(session.controller().clone());

            let file = tokio::fs::File::open(journal)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", journal.display(), e))?;
            let mut reader = AsyncJournalReader::new(file.compat());
            let mut report = ReplayReport::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                debug!(events = batch.len(), "Processing journal batch");

                for result in processor.process_batch(batch).await {
                    report.record(result.event.rental(), &result.result);
                }
            }

            report.skipped = reader.skipped();
            Ok(report)
        })
    }
}

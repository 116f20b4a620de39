//! Processing strategy module for journal replay
//!
//! This module defines the Strategy pattern for replaying a rental journal
//! against a fleet. Strategies differ in how they read and schedule events
//! (synchronous streaming or asynchronous batches); both apply every event
//! through the same `LifecycleController` held by a [`ReplaySession`].

use crate::cli::StrategyType;
use std::path::Path;

pub mod r#async;
pub mod session;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use session::{ReplayReport, ReplaySession};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for journal replay
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the journal at `journal` against `session`
    ///
    /// # Returns
    ///
    /// * `Ok(ReplayReport)` once every row has been read
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be opened or the runtime cannot
    /// be created. Rows that fail to parse and events the controller rejects
    /// are logged and counted in the report; processing continues with the
    /// next row.
    fn process(&self, session: &ReplaySession, journal: &Path) -> Result<ReplayReport, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` is only used by the async strategy; `None` selects the defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

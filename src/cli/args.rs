use crate::core::{EngineConfig, LateHourRounding, RatePolicy};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Sender id used on outgoing SMS when none is given
pub const DEFAULT_SENDER_ID: &str = "RIDEON";

/// Replay a rental journal against a fleet and print the billing ledger
#[derive(Parser, Debug)]
#[command(name = "rental-billing-engine")]
#[command(about = "Replay a rental journal and print the billing ledger", long_about = None)]
pub struct CliArgs {
    /// Journal CSV file with start and return events
    #[arg(value_name = "JOURNAL", help = "Path to the journal CSV file")]
    pub journal: PathBuf,

    /// Fleet CSV file with the vehicles and their rates
    #[arg(long = "fleet", value_name = "FLEET", help = "Path to the fleet CSV file")]
    pub fleet: PathBuf,

    /// Processing strategy to use for the journal
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of journal events per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of journal events per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// How partial late hours are billed
    #[arg(long = "late-rounding", value_name = "MODE", default_value = "ceil")]
    pub late_rounding: LateHourRounding,

    /// Which rates a return is billed with
    #[arg(long = "rate-policy", value_name = "POLICY", default_value = "snapshot")]
    pub rate_policy: RatePolicy,

    /// Write the final fleet state to this file
    #[arg(long = "fleet-output", value_name = "FILE")]
    pub fleet_output: Option<PathBuf>,

    /// Render agreements and invoices into this directory
    #[arg(long = "documents-dir", value_name = "DIR")]
    pub documents_dir: Option<PathBuf>,

    /// Append customer SMS messages to this CSV file
    #[arg(long = "outbox", value_name = "FILE")]
    pub outbox: Option<PathBuf>,

    /// Sender id shown on customer SMS
    #[arg(long = "sender-id", value_name = "ID", default_value = DEFAULT_SENDER_ID)]
    pub sender_id: String,

    /// Shorten SMS document links to `<URL>/r/<id>`
    #[arg(long = "short-link-base", value_name = "URL")]
    pub short_link_base: Option<String>,

    /// Write the short link table to this file
    #[arg(long = "short-links", value_name = "FILE", requires = "short_link_base")]
    pub short_links: Option<PathBuf>,
}

/// Available journal processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.late_rounding, self.rate_policy)
    }
}

//! Rental Billing Engine CLI
//!
//! Command-line interface for replaying a rental journal against a fleet.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --fleet fleet.csv journal.csv > ledger.csv
//! cargo run -- --fleet fleet.csv --strategy sync journal.csv > ledger.csv
//! cargo run -- --fleet fleet.csv --batch-size 2000 --max-concurrent 8 journal.csv > ledger.csv
//! cargo run -- --fleet fleet.csv --documents-dir docs --outbox sms.csv journal.csv > ledger.csv
//! cargo run -- --fleet fleet.csv --documents-dir docs --outbox sms.csv \
//!     --short-link-base https://rideon.lk --short-links links.csv journal.csv > ledger.csv
//! ```
//!
//! The program loads the fleet, replays every journal event through the
//! lifecycle controller and writes the rental ledger to stdout. Logs go to
//! stderr and are filtered with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, unreadable fleet or journal, output failure, etc.)

use rental_billing_engine::cli::{self, CliArgs};
use rental_billing_engine::io::{
    write_short_links_csv, CsvOutbox, InMemoryLinkShortener, TextDocumentRenderer,
};
use rental_billing_engine::strategy::{self, ReplaySession};
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_billing_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let mut session = ReplaySession::from_fleet(&args.fleet, args.to_engine_config())?;

    if let Some(dir) = &args.documents_dir {
        let renderer = TextDocumentRenderer::new(dir)
            .map_err(|e| format!("Failed to prepare documents directory '{}': {}", dir.display(), e))?;
        session = session.with_documents(Arc::new(renderer));
    }

    let shortener = args
        .short_link_base
        .as_ref()
        .map(|base| Arc::new(InMemoryLinkShortener::new(base.as_str())));

    if let Some(path) = &args.outbox {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create outbox '{}': {}", path.display(), e))?;
        let mut outbox = CsvOutbox::new(file, args.sender_id.clone())
            .map_err(|e| format!("Failed to write outbox '{}': {}", path.display(), e))?;
        if let Some(shortener) = &shortener {
            outbox = outbox.with_shortener(shortener.clone());
        }
        session = session.with_notifier(Arc::new(outbox));
    }

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };

    let report = strategy.process(&session, &args.journal)?;
    info!(
        applied = report.applied,
        rejected = report.rejected,
        skipped = report.skipped,
        warnings = report.warnings,
        "Journal replay finished"
    );

    let mut output = std::io::stdout().lock();
    session.write_ledger(&mut output)?;

    if let Some(path) = &args.fleet_output {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create fleet output '{}': {}", path.display(), e))?;
        session.write_fleet(&mut BufWriter::new(file))?;
    }

    if let (Some(path), Some(shortener)) = (&args.short_links, &shortener) {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create short links '{}': {}", path.display(), e))?;
        write_short_links_csv(&shortener.links(), &mut BufWriter::new(file))?;
    }

    Ok(())
}

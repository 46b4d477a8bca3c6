//! Land title ledger CLI
//!
//! Runs ledger operations from a CSV file against a simulated network and
//! prints the resulting title holdings.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > holdings.csv
//! cargo run -- --strategy sync operations.csv > holdings.csv
//! cargo run -- --me P1 --parties P2,P3 --notary Notary operations.csv
//! cargo run -- --move-auth new-owner --log-level debug operations.csv
//! ```
//!
//! Holdings go to stdout; log output goes to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, no notary, etc.)

use land_title_ledger::cli;
use land_title_ledger::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let args = cli::parse_args();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let strategy = {
        let batch = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(
            args.strategy.clone(),
            batch,
            args.to_network_config(),
            args.to_ledger_config(),
        )
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "Processing failed");
        process::exit(1);
    }
}

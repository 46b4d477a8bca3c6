//! Synchronous processing strategy
//!
//! Runs operations one at a time against an `InMemoryLedger`, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Flow execution to `LandTitleApi`
//! - CSV output to `csv_format::write_holdings_csv`

use crate::api::LandTitleApi;
use crate::core::config::{LedgerConfig, NetworkConfig};
use crate::io::csv_format::write_holdings_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use land_title_ledger::core::{LedgerConfig, NetworkConfig};
/// use land_title_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(NetworkConfig::default(), LedgerConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("operations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    network: NetworkConfig,
    ledger: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(network: NetworkConfig, ledger: LedgerConfig) -> Self {
        Self { network, ledger }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Run every operation in file order, then write the holdings
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;
        let mut api = LandTitleApi::new(self.network.build(), self.ledger.clone())
            .map_err(|e| e.to_string())?;

        let mut applied = 0usize;
        let mut skipped = 0usize;
        for result in reader {
            match result {
                Ok(operation) => match api.apply(&operation) {
                    Ok(tx) => {
                        applied += 1;
                        info!(operation = %operation, tx = %tx.id(), "Operation applied");
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(operation = %operation, error = %e, "Operation failed");
                    }
                },
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "Skipping invalid record");
                }
            }
        }
        info!(applied, skipped, "Finished processing operations");

        write_holdings_csv(&api.titles(), output)
    }
}

//! Processing strategy module for batch ledger operations
//!
//! This module defines the Strategy pattern for complete processing pipelines,
//! covering both CSV parsing and running operations through the ledger. This
//! allows different implementations (synchronous, asynchronous batch) to be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::core::config::{LedgerConfig, NetworkConfig};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete operation pipelines
///
/// Each strategy reads operations from a CSV file, runs them against a fresh
/// ledger and writes the final title holdings to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process operations from input file and write holdings to output
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing operations
    /// * `output` - Mutable reference to a writer for outputting holdings
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all processing completed (possibly with skipped operations)
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The network has no notary
    /// - Output cannot be written
    ///
    /// Failed operations are logged and skipped; they do not end the run.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch` - Optional configuration for async batch processing (ignored for sync)
/// * `network` - Parties hosted by the simulated network
/// * `ledger` - Contract and flow settings
pub fn create_strategy(
    strategy_type: StrategyType,
    batch: Option<BatchConfig>,
    network: NetworkConfig,
    ledger: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(network, ledger)),
        StrategyType::Async => {
            let batch = batch.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch, network, ledger))
        }
    }
}

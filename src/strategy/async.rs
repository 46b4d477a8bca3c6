//! Asynchronous batch processing strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (title partitioning + tokio tasks)
//!     └── AsyncLandTitleApi
//!         ├── AsyncLedger (DashMap-backed notary checks and vault)
//!         └── NotaryClient ──> NotaryService task
//! ```
//!
//! Batches run one after the other, so a title's operations keep their file
//! order even when they span batches. Within a batch, titles run in parallel.

use crate::api::AsyncLandTitleApi;
use crate::core::config::{LedgerConfig, NetworkConfig};
use crate::core::r#async::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_holdings_csv;
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
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
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    network: NetworkConfig,
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, network: NetworkConfig, ledger: LedgerConfig) -> Self {
        Self {
            config,
            network,
            ledger,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Run operations batch by batch on a multi-threaded runtime
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, runtime errors, no notary) are returned
    /// immediately. Failed operations are logged and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let (api, notary_task) = AsyncLandTitleApi::spawn(
                self.network.build(),
                self.ledger.clone(),
                self.config.batch_size,
            )
            .map_err(|e| e.to_string())?;
            let processor = BatchProcessor::new(api.clone());

            let mut applied = 0usize;
            let mut skipped = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Wait for the whole batch so titles spanning batches stay ordered
                for result in processor.process_batch(batch).await {
                    match result.result {
                        Ok(_) => applied += 1,
                        Err(_) => skipped += 1,
                    }
                }
            }
            // Rejected records count as skipped
            skipped += reader.skipped();
            info!(applied, skipped, "Finished processing operations");

            let titles = api.titles();
            drop(processor);
            drop(api);
            if let Err(e) = notary_task.await {
                warn!(error = %e, "Notary task ended abnormally");
            }

            write_holdings_csv(&titles, output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn strategy(config: BatchConfig) -> AsyncProcessingStrategy {
        AsyncProcessingStrategy::new(
            config,
            NetworkConfig {
                me: "P1".to_string(),
                parties: vec!["P2".to_string(), "P3".to_string()],
                notary: "Notary".to_string(),
            },
            LedgerConfig::default(),
        )
    }

    #[test]
    fn test_async_strategy_issue_then_move() {
        let file = create_temp_csv("op,title,issuer,owner,recipient\nissue,TITLE-001,P1,P2,P3\n");
        let mut output = Vec::new();

        strategy(BatchConfig::default())
            .process(file.path(), &mut output)
            .unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.lines().nth(1).unwrap().starts_with("TITLE-001,P1,P3,"));
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        let file = create_temp_csv(
            "op,title,issuer,owner,recipient\n\
             issue,T-1,P1,P2,\n\
             issue,T-2,P1,P2,\n\
             transfer,T-1,,P3,\n\
             transfer,T-2,,P1,\n\
             transfer,T-1,,P1,\n",
        );
        let mut output = Vec::new();

        // Small batches force each title across several of them
        strategy(BatchConfig::new(2, 2))
            .process(file.path(), &mut output)
            .unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("T-1,P1,P1,"), "got: {}", lines[1]);
        assert!(lines[2].starts_with("T-2,P1,P1,"), "got: {}", lines[2]);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result =
            strategy(BatchConfig::default()).process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }
}

//! Batch processing with title-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! ledger operations concurrently while keeping each title's operations in
//! their original order.
//!
//! # Design
//!
//! Operations on different titles never touch the same states, so they can
//! run in parallel. Operations on the same title (an issue followed by a
//! transfer, say) must run one after the other, since each consumes what the
//! previous one produced.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── AsyncLandTitleApi  (cloneable façade over AsyncLedger + NotaryClient)
//! ```

use std::collections::HashMap;

use crate::api::AsyncLandTitleApi;
use crate::types::{LedgerError, Operation, TransactionId};
use tracing::{error, warn};

/// Result of running a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was run
    pub operation: Operation,

    /// Id of the final transaction on success
    pub result: Result<TransactionId, LedgerError>,
}

/// Batch processor with title-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    api: AsyncLandTitleApi,
}

impl BatchProcessor {
    pub fn new(api: AsyncLandTitleApi) -> Self {
        Self { api }
    }

    /// Partition a batch of operations by title id
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one sub-batch
    /// - Operations for each title keep their original order
    pub fn partition_by_title(&self, batch: Vec<Operation>) -> HashMap<String, Vec<Operation>> {
        let mut title_batches: HashMap<String, Vec<Operation>> = HashMap::new();

        for operation in batch {
            title_batches
                .entry(operation.title().to_string())
                .or_default()
                .push(operation);
        }

        title_batches
    }

    /// Run every operation for one title sequentially
    ///
    /// A failed operation is logged and does not stop the ones after it.
    pub async fn process_title_operations(
        &self,
        operations: Vec<Operation>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = self.api.apply(&operation).await.map(|tx| tx.id());
            if let Err(e) = &result {
                warn!(operation = %operation, error = %e, "Operation failed");
            }
            results.push(ProcessingResult { operation, result });
        }

        results
    }

    /// Run a batch, one tokio task per title
    ///
    /// Results are grouped by title; their order across titles is unspecified.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let title_batches = self.partition_by_title(batch);

        let mut tasks = Vec::with_capacity(title_batches.len());
        for (_title, operations) in title_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_title_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(title_results) => results.extend(title_results),
                Err(e) => error!(error = %e, "Title task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LedgerConfig, NetworkConfig};

    fn processor() -> BatchProcessor {
        let network = NetworkConfig {
            me: "P1".to_string(),
            parties: vec!["P2".to_string(), "P3".to_string()],
            notary: "Notary".to_string(),
        }
        .build();
        let (api, _handle) =
            AsyncLandTitleApi::spawn(network, LedgerConfig::default(), 64).unwrap();
        BatchProcessor::new(api)
    }

    fn issue(title: &str, owner: &str) -> Operation {
        Operation::Issue {
            title: title.to_string(),
            issuer: "P1".to_string(),
            owner: owner.to_string(),
            recipient: owner.to_string(),
        }
    }

    fn transfer(title: &str, new_owner: &str) -> Operation {
        Operation::Transfer {
            title: title.to_string(),
            new_owner: new_owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_partition_keeps_per_title_order() {
        let processor = processor();
        let batch = vec![
            issue("T-1", "P2"),
            issue("T-2", "P2"),
            transfer("T-1", "P3"),
            transfer("T-1", "P1"),
        ];

        let partitions = processor.partition_by_title(batch);

        assert_eq!(partitions.len(), 2);
        assert_eq!(
            partitions["T-1"],
            vec![issue("T-1", "P2"), transfer("T-1", "P3"), transfer("T-1", "P1")]
        );
        assert_eq!(partitions["T-2"], vec![issue("T-2", "P2")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_runs_titles_concurrently() {
        let processor = processor();
        let mut batch = Vec::new();
        for i in 0..20 {
            let title = format!("T-{}", i);
            batch.push(issue(&title, "P2"));
            batch.push(transfer(&title, "P3"));
        }

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| r.result.is_ok()));
        let titles = processor.api.titles();
        assert_eq!(titles.len(), 20);
        assert!(titles.iter().all(|t| t.asset().unwrap().owner.name == "P3"));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_operations() {
        let processor = processor();
        let batch = vec![
            transfer("T-1", "P3"),
            issue("T-1", "Mallory"),
            issue("T-1", "P2"),
            transfer("T-1", "P3"),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 4);
        assert_eq!(
            results[0].result,
            Err(LedgerError::asset_not_found("T-1"))
        );
        assert_eq!(
            results[1].result,
            Err(LedgerError::unknown_party("Mallory"))
        );
        assert!(results[2].result.is_ok());
        assert!(results[3].result.is_ok());
    }
}

//! Notary actor
//!
//! `NotaryService` runs as a tokio task that owns the receiving end of an
//! mpsc channel. Each request carries the signed transaction and a oneshot
//! sender for the outcome. `NotaryClient` is the cheap, cloneable handle flows
//! use to talk to it.
//!
//! ```text
//! NotaryClient ──mpsc(NotaryRequest)──> NotaryService ──> AsyncLedger::commit
//!      ^                                     │
//!      └──────────oneshot(Result)────────────┘
//! ```
//!
//! The client waits for the answer under a deadline. It never resubmits: a
//! timed-out transaction may still be committed by the service.

use super::AsyncLedger;
use crate::types::{FinalizationError, FinalizedTransaction, SignedTransaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Outcome sent back to the submitting client
pub type NotaryReply = Result<FinalizedTransaction, FinalizationError>;

/// A single finalization request
#[derive(Debug)]
pub struct NotaryRequest {
    pub tx: SignedTransaction,
    pub reply: oneshot::Sender<NotaryReply>,
}

/// Notary task that commits requests to an `AsyncLedger`
#[derive(Debug)]
pub struct NotaryService {
    ledger: Arc<AsyncLedger>,
    requests: mpsc::Receiver<NotaryRequest>,
}

impl NotaryService {
    /// Spawn the service on the current tokio runtime
    ///
    /// # Arguments
    ///
    /// * `ledger` - Ledger the requests are committed to
    /// * `capacity` - Bound of the request channel
    /// * `timeout` - How long clients wait for each answer
    ///
    /// # Returns
    ///
    /// A client handle and the service's join handle. The service stops once
    /// every client has been dropped.
    pub fn spawn(
        ledger: Arc<AsyncLedger>,
        capacity: usize,
        timeout: Duration,
    ) -> (NotaryClient, JoinHandle<()>) {
        let (sender, requests) = mpsc::channel(capacity.max(1));
        let service = NotaryService { ledger, requests };
        let handle = tokio::spawn(service.run());
        (NotaryClient::new(sender, timeout), handle)
    }

    async fn run(mut self) {
        info!(notary = %self.ledger.notary(), "Notary service started");

        while let Some(request) = self.requests.recv().await {
            let outcome = self.ledger.commit(request.tx);
            if request.reply.send(outcome).is_err() {
                debug!("Client stopped waiting before the notary answered");
            }
        }

        info!(notary = %self.ledger.notary(), "Notary service stopped");
    }
}

/// Handle for submitting transactions to a running `NotaryService`
#[derive(Debug, Clone)]
pub struct NotaryClient {
    requests: mpsc::Sender<NotaryRequest>,
    timeout: Duration,
}

impl NotaryClient {
    pub fn new(requests: mpsc::Sender<NotaryRequest>, timeout: Duration) -> Self {
        Self { requests, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submit a transaction and wait for the notary's answer
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the service has stopped or drops the request
    /// - `Timeout` if no answer arrives within the client's deadline
    /// - Whatever the ledger rejected the transaction with
    pub async fn submit_and_finalize(
        &self,
        tx: SignedTransaction,
    ) -> Result<FinalizedTransaction, FinalizationError> {
        let (reply, response) = oneshot::channel();

        // The deadline covers queueing as well as the answer
        let exchange = async {
            self.requests
                .send(NotaryRequest { tx, reply })
                .await
                .map_err(|_| FinalizationError::Cancelled)?;
            response.await.map_err(|_| FinalizationError::Cancelled)?
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .unwrap_or(Err(FinalizationError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }))
    }
}

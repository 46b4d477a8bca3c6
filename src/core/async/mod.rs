//! Asynchronous implementations of core components
//!
//! This module provides the concurrent counterparts of the synchronous ledger
//! and flows, for use from a multi-threaded tokio runtime.
//!
//! # Architecture
//!
//! - **AsyncLedger**: Thread-safe notary checks and vault using DashMap
//! - **NotaryService / NotaryClient**: Notary actor fed by an mpsc channel, answering over oneshot
//! - **AsyncIssueTitleFlow / AsyncTransferTitleFlow**: The title flows, finalizing through a
//!   NotaryClient
//! - **BatchProcessor**: Runs batches of operations, partitioned by title
//! - **BuyerFlow**: Buyer side of a seller-initiated exchange
//!
//! # Thread Safety
//!
//! - Operations on different titles proceed in parallel
//! - An input is consumed by at most one transaction, however many race for it
//! - No global locks; the ledger locks per entry

pub mod batch_processor;
pub mod flow;
pub mod ledger;
pub mod notary;
pub mod trade;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use flow::{AsyncIssueTitleFlow, AsyncTransferTitleFlow};
pub use ledger::AsyncLedger;
pub use notary::{NotaryClient, NotaryRequest, NotaryService};
pub use trade::{Amount, BuyerFlow, BuyerState, TradeProtocol};

//! Land Title Ledger Library
//! # Overview
//!
//! A transaction-based asset-ownership ledger: parties issue land titles and
//! move them between owners. Every change is a transaction that a contract
//! verifies and a notary finalizes.
//!
//! # Architecture
//!
//! - [`types`] - States, commands, transactions, parties and errors
//! - [`core`] - Ledger engine:
//!   - [`core::contract`] - Verification rules and the move generator
//!   - [`core::builder`] - Transaction assembly
//!   - [`core::flow`] - The issue-then-move and transfer flows
//!   - [`core::ledger`] / [`core::identity`] - In-memory notary, vault and network map
//!   - [`core::async`] - Concurrent ledger, notary actor, async flows and the buyer hook
//! - [`api`] - Request/response façade
//! - [`io`] - CSV operation input and holdings output
//! - [`strategy`] - Sync and async batch pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Title lifecycle
//!
//! - **Issue**: no inputs, one title output, a time window, signed by the issuing node
//! - **Move**: consumes the title, produces one copy with a new owner, signed
//!   per the configured authorization rule
//!
//! A consumed title can never be consumed again; the notary rejects the
//! second spend.

pub mod api;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use api::{ApiResponse, AsyncLandTitleApi, LandTitleApi, ResponseStatus};
pub use core::{AssetContract, LedgerConfig, MoveAuthorization, NetworkConfig, TransactionBuilder};
pub use io::write_holdings_csv;
pub use types::{
    AssetState, Command, FinalizationError, LedgerError, Operation, PartyRef, StateAndRef,
    VerificationError,
};

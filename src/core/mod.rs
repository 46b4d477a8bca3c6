//! Core business logic module
//!
//! This module contains the ledger engine components:
//! - `contract` - Title verification rules and the move generator
//! - `builder` - Transaction assembly
//! - `flow` - Issue-then-move and transfer flows
//! - `traits` - Collaborator traits for finality, identity, keys and the vault
//! - `identity` - In-memory network map with signing keys
//! - `notary` - Notary identity and the checks run before commit
//! - `ledger` - Single-threaded notary and vault
//! - `config` - Ledger and network settings
//! - `async` - Concurrent ledger, notary actor and async flows

pub mod r#async;
pub mod builder;
pub mod config;
pub mod contract;
pub mod flow;
pub mod identity;
pub mod ledger;
pub mod notary;
pub mod traits;

pub use builder::TransactionBuilder;
pub use config::{LedgerConfig, NetworkConfig};
pub use contract::{AssetContract, MoveAuthorization, DEFAULT_CONTRACT_ID};
pub use flow::{IssueTitleFlow, TransferTitleFlow};
pub use identity::NetworkMap;
pub use ledger::InMemoryLedger;
pub use notary::NotaryIdentity;
pub use r#async::{AsyncLedger, BatchProcessor, NotaryClient, NotaryService};

//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `party`: Party identities and keys
//! - `state`: Title states and references to committed outputs
//! - `command`: Commands and their signers
//! - `transaction`: Wire, signed, finalized and ledger transactions
//! - `operation`: Ledger operations read by the batch driver
//! - `error`: Error types for the ledger

pub mod command;
mod encoding;
pub mod error;
pub mod operation;
pub mod party;
pub mod state;
pub mod transaction;

pub use command::{Command, CommandWithSigners};
pub use error::{FinalizationError, LedgerError, VerificationError};
pub use operation::{Operation, OperationType};
pub use party::{PartyRef, PublicKey};
pub use state::{AssetState, ContractId, StateAndRef, StateData, StateRef, TransactionState};
pub use transaction::{
    FinalizedTransaction, LedgerTransaction, SignedTransaction, TimeWindow, TransactionId,
    TransactionSignature, WireTransaction,
};

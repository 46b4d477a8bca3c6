//! Error types for the land title ledger
//!
//! This module defines every error that can occur between building a
//! transaction and committing it.
//!
//! # Error Categories
//!
//! - **Verification Errors**: a contract rejected the transaction. These are
//!   never recovered locally; the whole transaction is rejected.
//! - **Finalization Errors**: the notary refused or could not be reached
//!   (double spend, missing signature, timeout, etc.).
//! - **Ledger Errors**: everything a flow or the façade can surface, including
//!   unknown parties, vault lookups and I/O.

use super::party::PublicKey;
use super::state::StateRef;
use super::transaction::TransactionId;
use thiserror::Error;

/// Contract verification failure
///
/// Each variant names the rule that was broken. Variants carry a detail
/// message describing the offending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The transaction does not carry exactly one command
    #[error("Malformed transaction: expected exactly one command, found {count}")]
    MalformedTransaction {
        /// Number of commands present
        count: usize,
    },

    /// The transaction does not carry exactly one title output
    #[error("Ambiguous output: expected exactly one title output, found {count}")]
    AmbiguousOutput {
        /// Number of title outputs present
        count: usize,
    },

    /// An issuance has no time window
    #[error("Issuances must have a time-window")]
    MissingTimeWindow,

    /// An issuance consumes inputs
    #[error("No input during the issuance: found {count} inputs")]
    UnexpectedInput {
        /// Number of inputs present
        count: usize,
    },

    /// A required key did not sign the command
    #[error("Unauthorized signer: {role} key {key} is not among the command signers")]
    UnauthorizedSigner {
        /// Which party was expected to sign ("owner", "issuer", ...)
        role: String,
        /// The key that was missing
        key: PublicKey,
    },

    /// A move would destroy or duplicate the title
    #[error("The state is not propagated: {reason}")]
    StatePropagationViolation {
        /// What went wrong
        reason: String,
    },

    /// The command is not one this contract handles
    #[error("Unrecognised command '{command}'")]
    UnrecognizedCommand {
        /// Name of the command
        command: String,
    },
}

impl VerificationError {
    pub fn malformed_transaction(count: usize) -> Self {
        VerificationError::MalformedTransaction { count }
    }

    pub fn ambiguous_output(count: usize) -> Self {
        VerificationError::AmbiguousOutput { count }
    }

    pub fn unexpected_input(count: usize) -> Self {
        VerificationError::UnexpectedInput { count }
    }

    pub fn unauthorized_signer(role: &str, key: PublicKey) -> Self {
        VerificationError::UnauthorizedSigner {
            role: role.to_string(),
            key,
        }
    }

    pub fn state_propagation(reason: impl Into<String>) -> Self {
        VerificationError::StatePropagationViolation {
            reason: reason.into(),
        }
    }

    pub fn unrecognized_command(command: &str) -> Self {
        VerificationError::UnrecognizedCommand {
            command: command.to_string(),
        }
    }
}

/// Reasons the finality service refused or failed to commit a transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizationError {
    /// Contract verification rejected the transaction
    #[error("Contract verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// An input ref does not point at any committed output
    #[error("Input {state_ref} does not exist on the ledger")]
    UnknownInput { state_ref: StateRef },

    /// An input has already been consumed by another transaction
    #[error("Input {state_ref} was already consumed by transaction {consumed_by}")]
    DoubleSpend {
        state_ref: StateRef,
        consumed_by: TransactionId,
    },

    /// A command signer has not signed
    #[error("Missing signature from key {key}")]
    MissingSignature { key: PublicKey },

    /// A signature does not verify against the transaction id
    #[error("Invalid signature from key {key}")]
    InvalidSignature { key: PublicKey },

    /// The transaction names a different notary
    #[error("Transaction names notary '{requested}' but was submitted to '{actual}'")]
    WrongNotary { requested: String, actual: String },

    /// The current time falls outside the transaction's time window
    #[error("Transaction {tx} is outside its time-window")]
    OutsideTimeWindow { tx: TransactionId },

    /// The notary did not answer in time
    #[error("Finalization timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// The notary went away before answering
    #[error("Finalization was cancelled: notary service is not running")]
    Cancelled,
}

impl FinalizationError {
    pub fn unknown_input(state_ref: StateRef) -> Self {
        FinalizationError::UnknownInput { state_ref }
    }

    pub fn double_spend(state_ref: StateRef, consumed_by: TransactionId) -> Self {
        FinalizationError::DoubleSpend {
            state_ref,
            consumed_by,
        }
    }

    pub fn missing_signature(key: PublicKey) -> Self {
        FinalizationError::MissingSignature { key }
    }

    pub fn invalid_signature(key: PublicKey) -> Self {
        FinalizationError::InvalidSignature { key }
    }

    pub fn wrong_notary(requested: &str, actual: &str) -> Self {
        FinalizationError::WrongNotary {
            requested: requested.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Main error type for flows and the façade
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A party name could not be resolved
    #[error("Party named {name} cannot be found.")]
    UnknownParty { name: String },

    /// Finalization of a transaction failed
    #[error(transparent)]
    Finalization(#[from] FinalizationError),

    /// Local verification failed before submission
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// No unconsumed title with this id is held
    #[error("No unconsumed title with id '{asset_id}'")]
    AssetNotFound { asset_id: String },

    /// More than one unconsumed title shares this id
    #[error("{count} unconsumed titles share id '{asset_id}'")]
    AssetNotUnique { asset_id: String, count: usize },

    /// The title was issued but the follow-up move failed
    ///
    /// The issuance stays on the ledger. The caller must start a separate
    /// transfer to complete the hand-over.
    #[error("Title issued in transaction {issuance} but transfer failed: {cause}")]
    TransferIncomplete {
        issuance: TransactionId,
        cause: Box<LedgerError>,
    },

    /// A flow session closed before the expected message arrived
    #[error("Session closed while {step}")]
    SessionClosed { step: String },

    /// No notary is registered on the network
    #[error("No notary nodes registered")]
    NoNotary,

    /// Input/output failure
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A record could not be parsed
    #[error("Parse error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse { line: Option<u64>, message: String },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    pub fn unknown_party(name: &str) -> Self {
        LedgerError::UnknownParty {
            name: name.to_string(),
        }
    }

    pub fn asset_not_found(asset_id: &str) -> Self {
        LedgerError::AssetNotFound {
            asset_id: asset_id.to_string(),
        }
    }

    pub fn asset_not_unique(asset_id: &str, count: usize) -> Self {
        LedgerError::AssetNotUnique {
            asset_id: asset_id.to_string(),
            count,
        }
    }

    pub fn transfer_incomplete(issuance: TransactionId, cause: LedgerError) -> Self {
        LedgerError::TransferIncomplete {
            issuance,
            cause: Box::new(cause),
        }
    }

    pub fn session_closed(step: &str) -> Self {
        LedgerError::SessionClosed {
            step: step.to_string(),
        }
    }

    pub fn parse(line: Option<u64>, message: impl Into<String>) -> Self {
        LedgerError::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::malformed(
        VerificationError::MalformedTransaction { count: 2 },
        "Malformed transaction: expected exactly one command, found 2"
    )]
    #[case::ambiguous_output(
        VerificationError::AmbiguousOutput { count: 0 },
        "Ambiguous output: expected exactly one title output, found 0"
    )]
    #[case::missing_time_window(
        VerificationError::MissingTimeWindow,
        "Issuances must have a time-window"
    )]
    #[case::unexpected_input(
        VerificationError::UnexpectedInput { count: 1 },
        "No input during the issuance: found 1 inputs"
    )]
    #[case::state_propagation(
        VerificationError::StatePropagationViolation { reason: "2 outputs".to_string() },
        "The state is not propagated: 2 outputs"
    )]
    #[case::unrecognized(
        VerificationError::UnrecognizedCommand { command: "Redeem".to_string() },
        "Unrecognised command 'Redeem'"
    )]
    fn test_verification_error_display(#[case] error: VerificationError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::unknown_party(
        LedgerError::unknown_party("O=Bank C"),
        "Party named O=Bank C cannot be found."
    )]
    #[case::not_found(
        LedgerError::asset_not_found("TITLE-404"),
        "No unconsumed title with id 'TITLE-404'"
    )]
    #[case::not_unique(
        LedgerError::asset_not_unique("TITLE-001", 2),
        "2 unconsumed titles share id 'TITLE-001'"
    )]
    #[case::parse_with_line(
        LedgerError::parse(Some(3), "bad op"),
        "Parse error at line 3: bad op"
    )]
    #[case::parse_without_line(LedgerError::parse(None, "bad op"), "Parse error: bad op")]
    #[case::no_notary(LedgerError::NoNotary, "No notary nodes registered")]
    fn test_ledger_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_verification_error_passes_through_finalization() {
        let error: LedgerError =
            FinalizationError::from(VerificationError::MissingTimeWindow).into();

        assert_eq!(
            error.to_string(),
            "Contract verification failed: Issuances must have a time-window"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::Io { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}

//! Ledger operations read by the batch driver
//!
//! Each operation maps onto one façade call: `Issue` runs the issue-then-move
//! flow, `Transfer` moves a title already held in the vault.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of operation the batch driver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Issue a title and move it to a recipient
    Issue,

    /// Move a held title to a new owner
    Transfer,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Issue => write!(f, "issue"),
            OperationType::Transfer => write!(f, "transfer"),
        }
    }
}

/// A validated ledger operation
///
/// Parties are carried by legal name; they are resolved against the network
/// map when the operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Issue {
        title: String,
        issuer: String,
        owner: String,
        /// Party the title is moved to once issued
        recipient: String,
    },
    Transfer {
        title: String,
        new_owner: String,
    },
}

impl Operation {
    /// Id of the title this operation touches
    pub fn title(&self) -> &str {
        match self {
            Operation::Issue { title, .. } | Operation::Transfer { title, .. } => title,
        }
    }

    pub fn op_type(&self) -> OperationType {
        match self {
            Operation::Issue { .. } => OperationType::Issue,
            Operation::Transfer { .. } => OperationType::Transfer,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Issue {
                title,
                issuer,
                owner,
                recipient,
            } => write!(
                f,
                "issue {} (issuer {}, owner {}, recipient {})",
                title, issuer, owner, recipient
            ),
            Operation::Transfer { title, new_owner } => {
                write!(f, "transfer {} to {}", title, new_owner)
            }
        }
    }
}

//! Commands carried by ledger transactions
//!
//! A command states the business intent of a transaction. It has no payload;
//! what it authorizes depends entirely on its kind and on who signed it.

use super::encoding::put_str;
use super::party::PublicKey;
use std::collections::BTreeSet;
use std::fmt;

/// Business intent of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Create a new title with no prior input
    Issue,

    /// Reassign an existing title to a new owner
    Move,

    /// A command belonging to another contract, carried by name
    External(String),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Issue => "Issue",
            Command::Move => "Move",
            Command::External(name) => name,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command together with the keys required to sign it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandWithSigners {
    pub value: Command,
    pub signers: BTreeSet<PublicKey>,
}

impl CommandWithSigners {
    pub fn new(value: Command, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        CommandWithSigners {
            value,
            signers: signers.into_iter().collect(),
        }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        match &self.value {
            Command::Issue => out.push(0),
            Command::Move => out.push(1),
            Command::External(name) => {
                out.push(2);
                put_str(out, name);
            }
        }
        out.extend_from_slice(&(self.signers.len() as u32).to_le_bytes());
        for key in &self.signers {
            out.extend_from_slice(key.as_bytes());
        }
    }
}

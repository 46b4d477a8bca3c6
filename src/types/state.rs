//! Ledger state types
//!
//! This module defines the land title asset and the wrappers the ledger uses
//! to place states inside transactions and refer back to them once committed.

use super::encoding::{put_bytes, put_str};
use super::party::PartyRef;
use super::transaction::TransactionId;
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of the contract that governs a state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId(String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        ContractId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A land title: a single unit of ownership
///
/// Titles are never changed in place. A transfer consumes the current
/// version and produces a new one through [`AssetState::with_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetState {
    /// Title identifier, e.g. `TITLE-001`
    pub asset_id: String,

    /// Party that issued the title
    pub issuer: PartyRef,

    /// Party currently holding the title
    pub owner: PartyRef,

    /// Parties that track this state; always contains `owner`
    participants: BTreeSet<PartyRef>,
}

impl AssetState {
    /// Create a title whose only participant is its owner
    pub fn new(asset_id: impl Into<String>, issuer: PartyRef, owner: PartyRef) -> Self {
        let participants = BTreeSet::from([owner.clone()]);
        AssetState {
            asset_id: asset_id.into(),
            issuer,
            owner,
            participants,
        }
    }

    /// Create a title with extra participants
    ///
    /// The owner is added to the set if the caller left it out.
    pub fn with_participants(
        asset_id: impl Into<String>,
        issuer: PartyRef,
        owner: PartyRef,
        participants: impl IntoIterator<Item = PartyRef>,
    ) -> Self {
        let mut participants: BTreeSet<PartyRef> = participants.into_iter().collect();
        participants.insert(owner.clone());
        AssetState {
            asset_id: asset_id.into(),
            issuer,
            owner,
            participants,
        }
    }

    pub fn participants(&self) -> &BTreeSet<PartyRef> {
        &self.participants
    }

    /// Copy of this title held by `new_owner`
    ///
    /// The previous owner stops being a participant; any other participants
    /// are carried over.
    pub fn with_owner(&self, new_owner: PartyRef) -> AssetState {
        let mut participants = self.participants.clone();
        participants.remove(&self.owner);
        participants.insert(new_owner.clone());
        AssetState {
            asset_id: self.asset_id.clone(),
            issuer: self.issuer.clone(),
            owner: new_owner,
            participants,
        }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        put_str(out, &self.asset_id);
        put_bytes(out, self.issuer.owning_key.as_bytes());
        put_bytes(out, self.owner.owning_key.as_bytes());
        out.extend_from_slice(&(self.participants.len() as u32).to_le_bytes());
        for party in &self.participants {
            put_bytes(out, party.owning_key.as_bytes());
        }
    }
}

/// Payload of a transaction output
///
/// Transactions may carry states belonging to other contracts alongside
/// titles; those are opaque to the title contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateData {
    Asset(AssetState),
    External { kind: String },
}

impl StateData {
    pub fn as_asset(&self) -> Option<&AssetState> {
        match self {
            StateData::Asset(asset) => Some(asset),
            StateData::External { .. } => None,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            StateData::Asset(asset) => {
                out.push(0);
                asset.encode(out);
            }
            StateData::External { kind } => {
                out.push(1);
                put_str(out, kind);
            }
        }
    }
}

/// A state as placed in a transaction, tagged with its governing contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionState {
    pub data: StateData,
    pub contract: ContractId,
}

impl TransactionState {
    pub fn new(data: StateData, contract: ContractId) -> Self {
        TransactionState { data, contract }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        put_str(out, self.contract.as_str());
        self.data.encode(out);
    }
}

/// Pointer to an output of a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateRef {
    pub txhash: TransactionId,
    pub index: u32,
}

impl StateRef {
    pub fn new(txhash: TransactionId, index: u32) -> Self {
        StateRef { txhash, index }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.txhash.as_bytes());
        out.extend_from_slice(&self.index.to_le_bytes());
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}

/// A resolved state together with the ref it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateAndRef {
    pub state: TransactionState,
    pub state_ref: StateRef,
}

impl StateAndRef {
    pub fn new(state: TransactionState, state_ref: StateRef) -> Self {
        StateAndRef { state, state_ref }
    }

    /// The title carried by this state, if it is one
    pub fn asset(&self) -> Option<&AssetState> {
        self.state.data.as_asset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublicKey;

    fn party(name: &str, byte: u8) -> PartyRef {
        PartyRef::new(name, PublicKey::from_bytes([byte; 32]))
    }

    #[test]
    fn test_new_asset_participants_default_to_owner() {
        let asset = AssetState::new("TITLE-001", party("P1", 1), party("P2", 2));

        assert_eq!(asset.participants().len(), 1);
        assert!(asset.participants().contains(&party("P2", 2)));
    }

    #[test]
    fn test_with_participants_always_includes_owner() {
        let asset = AssetState::with_participants(
            "TITLE-001",
            party("P1", 1),
            party("P2", 2),
            [party("P4", 4)],
        );

        assert!(asset.participants().contains(&party("P2", 2)));
        assert!(asset.participants().contains(&party("P4", 4)));
    }

    #[test]
    fn test_with_owner_replaces_owner_and_participant() {
        let asset = AssetState::with_participants(
            "TITLE-001",
            party("P1", 1),
            party("P2", 2),
            [party("P4", 4)],
        );

        let moved = asset.with_owner(party("P3", 3));

        assert_eq!(moved.asset_id, "TITLE-001");
        assert_eq!(moved.issuer, party("P1", 1));
        assert_eq!(moved.owner, party("P3", 3));
        assert!(moved.participants().contains(&party("P3", 3)));
        assert!(moved.participants().contains(&party("P4", 4)));
        assert!(!moved.participants().contains(&party("P2", 2)));
        // The original is untouched
        assert_eq!(asset.owner, party("P2", 2));
    }
}

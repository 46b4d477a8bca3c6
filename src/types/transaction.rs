//! Transaction types for the land title ledger
//!
//! A transaction moves through three shapes on its way to the ledger:
//!
//! - [`WireTransaction`]: what a builder assembles. Inputs are bare refs.
//! - [`SignedTransaction`]: the wire transaction plus party signatures over its id.
//! - [`FinalizedTransaction`]: a signed transaction the notary has committed.
//!
//! The contract never sees any of these directly. It verifies a
//! [`LedgerTransaction`], in which every input ref has been resolved to the
//! state it points at.

use super::command::CommandWithSigners;
use super::error::FinalizationError;
use super::party::{PartyRef, PublicKey};
use super::state::{StateAndRef, StateRef, TransactionState};
use ed25519_dalek::{Signature, Signer, SigningKey};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// SHA-256 identifier of a transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        TransactionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({}..)", hex::encode_upper(&self.0[..8]))
    }
}

/// Validity window of a transaction
///
/// `until` is exclusive. A window without `until` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: SystemTime,
    pub until: Option<SystemTime>,
}

impl TimeWindow {
    pub fn between(from: SystemTime, until: SystemTime) -> Self {
        TimeWindow {
            from,
            until: Some(until),
        }
    }

    pub fn from_start_and_duration(from: SystemTime, duration: Duration) -> Self {
        Self::between(from, from + duration)
    }

    pub fn contains(&self, instant: SystemTime) -> bool {
        instant >= self.from && self.until.is_none_or(|until| instant < until)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&unix_nanos(self.from).to_le_bytes());
        match self.until {
            Some(until) => {
                out.push(1);
                out.extend_from_slice(&unix_nanos(until).to_le_bytes());
            }
            None => out.push(0),
        }
    }
}

fn unix_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// An unsigned transaction as assembled by a builder
///
/// The id is derived from the content at construction time, so the fields
/// are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTransaction {
    id: TransactionId,
    inputs: Vec<StateRef>,
    outputs: Vec<TransactionState>,
    commands: Vec<CommandWithSigners>,
    time_window: Option<TimeWindow>,
    notary: PartyRef,
    privacy_salt: [u8; 32],
}

impl WireTransaction {
    pub fn new(
        inputs: Vec<StateRef>,
        outputs: Vec<TransactionState>,
        commands: Vec<CommandWithSigners>,
        time_window: Option<TimeWindow>,
        notary: PartyRef,
        privacy_salt: [u8; 32],
    ) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(inputs.len() as u32).to_le_bytes());
        for input in &inputs {
            input.encode(&mut bytes);
        }
        bytes.extend_from_slice(&(outputs.len() as u32).to_le_bytes());
        for output in &outputs {
            output.encode(&mut bytes);
        }
        bytes.extend_from_slice(&(commands.len() as u32).to_le_bytes());
        for command in &commands {
            command.encode(&mut bytes);
        }
        match &time_window {
            Some(window) => {
                bytes.push(1);
                window.encode(&mut bytes);
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(notary.owning_key.as_bytes());
        bytes.extend_from_slice(&privacy_salt);

        let id = TransactionId(Sha256::digest(&bytes).into());

        WireTransaction {
            id,
            inputs,
            outputs,
            commands,
            time_window,
            notary,
            privacy_salt,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionState] {
        &self.outputs
    }

    pub fn commands(&self) -> &[CommandWithSigners] {
        &self.commands
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn notary(&self) -> &PartyRef {
        &self.notary
    }

    /// Every key named as a signer by any command
    pub fn required_signing_keys(&self) -> BTreeSet<PublicKey> {
        self.commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }

    /// The output at `index` paired with the ref it will have once committed
    pub fn out_ref(&self, index: u32) -> Option<StateAndRef> {
        self.outputs
            .get(index as usize)
            .map(|state| StateAndRef::new(state.clone(), StateRef::new(self.id, index)))
    }

    /// Resolve every input ref into a ledger transaction
    ///
    /// Fails with [`FinalizationError::UnknownInput`] on the first ref the
    /// resolver cannot find.
    pub fn to_ledger_transaction<F>(
        &self,
        mut resolve: F,
    ) -> Result<LedgerTransaction, FinalizationError>
    where
        F: FnMut(&StateRef) -> Option<StateAndRef>,
    {
        let inputs = self
            .inputs
            .iter()
            .map(|state_ref| {
                resolve(state_ref).ok_or_else(|| FinalizationError::unknown_input(*state_ref))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LedgerTransaction {
            id: self.id,
            inputs,
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            time_window: self.time_window,
            notary: self.notary.clone(),
        })
    }
}

/// A transaction with every input resolved, as consumed by contract verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<TransactionState>,
    pub commands: Vec<CommandWithSigners>,
    pub time_window: Option<TimeWindow>,
    pub notary: PartyRef,
}

/// A signature over a transaction id by one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub by: PublicKey,
    pub signature: Signature,
}

impl TransactionSignature {
    /// Sign a transaction id
    pub fn sign(key: &SigningKey, id: &TransactionId) -> Self {
        TransactionSignature {
            by: PublicKey::from(key.verifying_key()),
            signature: key.sign(id.as_bytes()),
        }
    }

    /// Check this signature against the id it claims to cover
    pub fn is_valid_for(&self, id: &TransactionId) -> bool {
        self.by
            .verifying_key()
            .is_some_and(|key| key.verify_strict(id.as_bytes(), &self.signature).is_ok())
    }
}

/// A wire transaction plus the party signatures collected for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: WireTransaction,
    pub sigs: Vec<TransactionSignature>,
}

impl SignedTransaction {
    pub fn new(tx: WireTransaction) -> Self {
        SignedTransaction {
            tx,
            sigs: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.tx.id()
    }

    pub fn with_signature(mut self, sig: TransactionSignature) -> Self {
        if !self.sigs.iter().any(|existing| existing.by == sig.by) {
            self.sigs.push(sig);
        }
        self
    }

    /// Check that every command signer has signed, and that every signature is valid
    pub fn verify_signatures(&self) -> Result<(), FinalizationError> {
        let id = self.id();

        for sig in &self.sigs {
            if !sig.is_valid_for(&id) {
                return Err(FinalizationError::invalid_signature(sig.by));
            }
        }

        for key in self.tx.required_signing_keys() {
            if !self.sigs.iter().any(|sig| sig.by == key) {
                return Err(FinalizationError::missing_signature(key));
            }
        }

        Ok(())
    }
}

/// A transaction committed to the ledger by its notary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    pub signed: SignedTransaction,
    pub notary_signature: TransactionSignature,
}

impl FinalizedTransaction {
    pub fn id(&self) -> TransactionId {
        self.signed.id()
    }

    pub fn tx(&self) -> &WireTransaction {
        &self.signed.tx
    }

    pub fn out_ref(&self, index: u32) -> Option<StateAndRef> {
        self.signed.tx.out_ref(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetState, Command, ContractId, StateData};
    use rand::rngs::OsRng;

    fn party(key: &SigningKey, name: &str) -> PartyRef {
        PartyRef::new(name, PublicKey::from(key.verifying_key()))
    }

    fn issue_tx(owner: &PartyRef, notary: &PartyRef, salt: [u8; 32]) -> WireTransaction {
        let output = TransactionState::new(
            StateData::Asset(AssetState::new("TITLE-001", owner.clone(), owner.clone())),
            ContractId::new("test"),
        );
        WireTransaction::new(
            vec![],
            vec![output],
            vec![CommandWithSigners::new(Command::Issue, [owner.owning_key])],
            None,
            notary.clone(),
            salt,
        )
    }

    #[test]
    fn test_privacy_salt_changes_id() {
        let owner_key = SigningKey::generate(&mut OsRng);
        let notary_key = SigningKey::generate(&mut OsRng);
        let owner = party(&owner_key, "P1");
        let notary = party(&notary_key, "Notary");

        let a = issue_tx(&owner, &notary, [0u8; 32]);
        let b = issue_tx(&owner, &notary, [0u8; 32]);
        let c = issue_tx(&owner, &notary, [1u8; 32]);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_time_window_contains() {
        let start = UNIX_EPOCH + Duration::from_secs(1_000);
        let window = TimeWindow::from_start_and_duration(start, Duration::from_secs(30));

        assert!(window.contains(start));
        assert!(window.contains(start + Duration::from_secs(29)));
        assert!(!window.contains(start + Duration::from_secs(30)));
        assert!(!window.contains(start - Duration::from_secs(1)));
    }

    #[test]
    fn test_verify_signatures_reports_missing_signer() {
        let owner_key = SigningKey::generate(&mut OsRng);
        let notary_key = SigningKey::generate(&mut OsRng);
        let owner = party(&owner_key, "P1");
        let notary = party(&notary_key, "Notary");
        let signed = SignedTransaction::new(issue_tx(&owner, &notary, [0u8; 32]));

        let result = signed.verify_signatures();

        assert!(matches!(
            result,
            Err(FinalizationError::MissingSignature { key }) if key == owner.owning_key
        ));
    }

    #[test]
    fn test_verify_signatures_rejects_signature_over_other_tx() {
        let owner_key = SigningKey::generate(&mut OsRng);
        let notary_key = SigningKey::generate(&mut OsRng);
        let owner = party(&owner_key, "P1");
        let notary = party(&notary_key, "Notary");
        let tx = issue_tx(&owner, &notary, [0u8; 32]);
        let other = issue_tx(&owner, &notary, [9u8; 32]);

        let signed = SignedTransaction::new(tx)
            .with_signature(TransactionSignature::sign(&owner_key, &other.id()));

        assert!(matches!(
            signed.verify_signatures(),
            Err(FinalizationError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_verify_signatures_accepts_signed_tx() {
        let owner_key = SigningKey::generate(&mut OsRng);
        let notary_key = SigningKey::generate(&mut OsRng);
        let owner = party(&owner_key, "P1");
        let notary = party(&notary_key, "Notary");
        let tx = issue_tx(&owner, &notary, [0u8; 32]);
        let id = tx.id();

        let signed =
            SignedTransaction::new(tx).with_signature(TransactionSignature::sign(&owner_key, &id));

        assert!(signed.verify_signatures().is_ok());
    }
}

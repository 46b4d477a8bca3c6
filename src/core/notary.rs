//! Notary checks shared by the sync and async ledgers
//!
//! Before a transaction is committed the notary checks, in order:
//! 1. The transaction names this notary
//! 2. Every signature is valid and every command signer has signed
//! 3. The current time falls inside the time window (if any)
//! 4. Every input resolves to a committed output
//! 5. The contract accepts the resolved transaction
//!
//! Input uniqueness is checked by each ledger when it commits, since that is
//! where the consumed set lives.

use crate::core::contract::AssetContract;
use crate::types::{
    FinalizationError, FinalizedTransaction, LedgerTransaction, PartyRef, PublicKey,
    SignedTransaction, StateAndRef, StateRef, TransactionSignature,
};
use ed25519_dalek::SigningKey;
use std::time::SystemTime;

/// Identity and signing key of a notary
#[derive(Debug, Clone)]
pub struct NotaryIdentity {
    party: PartyRef,
    key: SigningKey,
}

impl NotaryIdentity {
    pub fn new(name: &str, key: SigningKey) -> Self {
        let party = PartyRef::new(name, PublicKey::from(key.verifying_key()));
        NotaryIdentity { party, key }
    }

    pub fn party(&self) -> &PartyRef {
        &self.party
    }

    /// Countersign a transaction that passed every check
    pub fn finalize(&self, signed: SignedTransaction) -> FinalizedTransaction {
        let notary_signature = TransactionSignature::sign(&self.key, &signed.id());
        FinalizedTransaction {
            signed,
            notary_signature,
        }
    }
}

/// Run every stateless notary check and return the resolved transaction
///
/// # Arguments
///
/// * `notary` - The notary the transaction was submitted to
/// * `contract` - Contract that verifies the resolved transaction
/// * `signed` - The submitted transaction
/// * `now` - Time to check the window against
/// * `resolve` - Looks up a committed output by ref
///
/// # Errors
///
/// Returns the first failed check as a `FinalizationError`.
pub fn check_transaction<F>(
    notary: &PartyRef,
    contract: &AssetContract,
    signed: &SignedTransaction,
    now: SystemTime,
    resolve: F,
) -> Result<LedgerTransaction, FinalizationError>
where
    F: FnMut(&StateRef) -> Option<StateAndRef>,
{
    let tx = &signed.tx;

    if tx.notary() != notary {
        return Err(FinalizationError::wrong_notary(
            &tx.notary().name,
            &notary.name,
        ));
    }

    signed.verify_signatures()?;

    if let Some(window) = tx.time_window() {
        if !window.contains(now) {
            return Err(FinalizationError::OutsideTimeWindow { tx: tx.id() });
        }
    }

    let ledger_tx = tx.to_ledger_transaction(resolve)?;
    contract.verify(&ledger_tx)?;

    Ok(ledger_tx)
}

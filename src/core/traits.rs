//! Collaborator traits for finality, identity, keys and the vault
//!
//! Flows talk to the surrounding ledger platform only through these traits.
//! The crate ships in-memory implementations (`InMemoryLedger`, `NetworkMap`),
//! but any backend that honours the contracts below can be plugged in.

use crate::types::{
    FinalizationError, FinalizedTransaction, PartyRef, PublicKey, SignedTransaction,
    StateAndRef, TransactionSignature, WireTransaction,
};

/// Trait for committing transactions to the ledger
///
/// Implementations validate the transaction (signatures, input uniqueness,
/// time window, contract rules) and commit it atomically. Submitting is a
/// single-outcome operation: callers must not retry on failure, since the
/// same inputs may already have been consumed.
pub trait FinalityService {
    fn submit_and_finalize(
        &mut self,
        tx: SignedTransaction,
    ) -> Result<FinalizedTransaction, FinalizationError>;
}

/// Trait for looking up parties on the network
pub trait IdentityService {
    /// Find a party by legal name; `None` if nobody is registered under it
    fn resolve_party(&self, name: &str) -> Option<PartyRef>;

    /// The notary transactions should be finalized by, if one is registered
    fn current_notary(&self) -> Option<PartyRef>;

    /// The identity of the node running the flows
    fn me(&self) -> PartyRef;

    /// All known parties except this node and notaries
    fn peers(&self) -> Vec<PartyRef>;
}

/// Trait for signing transactions with locally held keys
pub trait KeyManagement {
    /// Sign with the private half of `key`, if this node holds it
    fn sign(&self, tx: &WireTransaction, key: &PublicKey) -> Option<TransactionSignature>;
}

/// Trait for querying unconsumed titles
pub trait Vault {
    /// Every unconsumed title, in commit order
    fn unconsumed_titles(&self) -> Vec<StateAndRef>;

    /// Unconsumed titles with the given id
    fn find_title(&self, asset_id: &str) -> Vec<StateAndRef> {
        self.unconsumed_titles()
            .into_iter()
            .filter(|state| state.asset().is_some_and(|asset| asset.asset_id == asset_id))
            .collect()
    }
}

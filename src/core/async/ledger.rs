//! Thread-safe ledger for concurrent finalization
//!
//! This module provides the `AsyncLedger` struct, the concurrent counterpart of
//! `InMemoryLedger`. It stores committed transactions, outputs and consumed
//! refs in `DashMap`s so that many tasks can submit at once.
//!
//! # Design
//!
//! Checks that only read immutable data (signatures, time window, input
//! resolution, contract rules) run without any lock. Inputs are then claimed
//! one at a time through the consumed map's entry API:
//!
//! ```text
//! for each input:
//!     Vacant   -> insert (ref -> this tx), remember claim
//!     Occupied -> remove every claim made so far, fail with DoubleSpend
//! ```
//!
//! # Thread Safety
//!
//! A ref can be claimed by exactly one transaction: the entry lock makes the
//! check and the insert a single step. A transaction that loses a race on any
//! of its inputs leaves no claim behind.

use crate::core::contract::AssetContract;
use crate::core::notary::{check_transaction, NotaryIdentity};
use crate::core::traits::Vault;
use crate::types::{
    FinalizationError, FinalizedTransaction, PartyRef, SignedTransaction, StateAndRef, StateRef,
    TransactionId,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, info};

/// Thread-safe notary and vault backed by DashMaps
#[derive(Debug)]
pub struct AsyncLedger {
    notary: NotaryIdentity,
    contract: AssetContract,

    /// Committed transactions by id
    transactions: DashMap<TransactionId, FinalizedTransaction>,

    /// Every output ever committed, tagged with its commit sequence number
    outputs: DashMap<StateRef, (u64, StateAndRef)>,

    /// Consumed refs and the transaction that consumed them
    consumed: DashMap<StateRef, TransactionId>,

    /// Next commit sequence number, for stable vault listings
    sequence: AtomicU64,
}

impl AsyncLedger {
    /// Create an empty ledger notarised by `notary` and verified by `contract`
    pub fn new(notary: NotaryIdentity, contract: AssetContract) -> Self {
        Self {
            notary,
            contract,
            transactions: DashMap::new(),
            outputs: DashMap::new(),
            consumed: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn notary(&self) -> &PartyRef {
        self.notary.party()
    }

    pub fn contract(&self) -> &AssetContract {
        &self.contract
    }

    /// Look up a committed transaction
    ///
    /// Returns a clone; later commits are not reflected in it.
    pub fn transaction(&self, id: &TransactionId) -> Option<FinalizedTransaction> {
        self.transactions.get(id).map(|entry| entry.value().clone())
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Transaction that consumed `state_ref`, if any
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<TransactionId> {
        self.consumed.get(state_ref).map(|entry| *entry.value())
    }

    /// Check and commit a signed transaction
    ///
    /// Safe to call from many tasks at once.
    ///
    /// # Arguments
    ///
    /// * `tx` - The signed transaction to finalize
    ///
    /// # Returns
    ///
    /// * `Ok(FinalizedTransaction)` - The transaction with the notary's signature
    /// * `Err(FinalizationError)` - The first failed check; nothing is committed
    pub fn commit(&self, tx: SignedTransaction) -> Result<FinalizedTransaction, FinalizationError> {
        let ledger_tx = check_transaction(
            self.notary.party(),
            &self.contract,
            &tx,
            SystemTime::now(),
            |state_ref| {
                self.outputs
                    .get(state_ref)
                    .map(|entry| entry.value().1.clone())
            },
        )?;

        let id = ledger_tx.id;
        let refs: Vec<StateRef> = ledger_tx.inputs.iter().map(|input| input.state_ref).collect();
        self.claim_inputs(&refs, id)?;

        for index in 0..tx.tx.outputs().len() as u32 {
            if let Some(output) = tx.tx.out_ref(index) {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                self.outputs.insert(output.state_ref, (seq, output));
            }
        }

        let finalized = self.notary.finalize(tx);
        self.transactions.insert(id, finalized.clone());

        info!(
            tx = %id,
            inputs = refs.len(),
            outputs = ledger_tx.outputs.len(),
            "Transaction committed to ledger"
        );

        Ok(finalized)
    }

    /// Mark every ref as consumed by `id`, or none of them
    fn claim_inputs(&self, refs: &[StateRef], id: TransactionId) -> Result<(), FinalizationError> {
        let mut claimed = Vec::with_capacity(refs.len());

        for state_ref in refs {
            // The entry guard must be released before rolling back
            let spent_by = match self.consumed.entry(*state_ref) {
                Entry::Occupied(entry) => Some(*entry.get()),
                Entry::Vacant(entry) => {
                    entry.insert(id);
                    None
                }
            };

            if let Some(consumed_by) = spent_by {
                for undo in &claimed {
                    self.consumed.remove(undo);
                }
                debug!(tx = %id, input = %state_ref, "Rolled back partial input claim");
                return Err(FinalizationError::double_spend(*state_ref, consumed_by));
            }
            claimed.push(*state_ref);
        }

        Ok(())
    }
}

impl Vault for AsyncLedger {
    fn unconsumed_titles(&self) -> Vec<StateAndRef> {
        let mut held: Vec<(u64, StateAndRef)> = self
            .outputs
            .iter()
            .filter(|entry| !self.consumed.contains_key(entry.key()))
            .filter(|entry| entry.value().1.asset().is_some())
            .map(|entry| entry.value().clone())
            .collect();

        held.sort_by_key(|(seq, _)| *seq);
        held.into_iter().map(|(_, state)| state).collect()
    }
}

//! In-memory ledger for single-threaded use
//!
//! This module provides the InMemoryLedger component, a notary and vault in
//! one. It keeps every committed transaction, every output ever produced and
//! the set of consumed refs, which is enough to resolve inputs, reject double
//! spends and answer vault queries.
//!
//! A transaction is committed all-or-nothing: if any check fails, nothing is
//! recorded.

use crate::core::contract::AssetContract;
use crate::core::notary::{check_transaction, NotaryIdentity};
use crate::core::traits::{FinalityService, Vault};
use crate::types::{
    FinalizationError, FinalizedTransaction, PartyRef, SignedTransaction, StateAndRef, StateRef,
    TransactionId,
};
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::{debug, info};

/// Notary and vault backed by HashMaps
#[derive(Debug)]
pub struct InMemoryLedger {
    notary: NotaryIdentity,
    contract: AssetContract,

    /// Committed transactions by id
    transactions: HashMap<TransactionId, FinalizedTransaction>,

    /// Every output ever committed, consumed or not
    outputs: HashMap<StateRef, StateAndRef>,

    /// Consumed refs and the transaction that consumed them
    consumed: HashMap<StateRef, TransactionId>,

    /// Output refs in commit order, for stable vault listings
    commit_order: Vec<StateRef>,
}

impl InMemoryLedger {
    /// Create an empty ledger notarised by `notary` and verified by `contract`
    pub fn new(notary: NotaryIdentity, contract: AssetContract) -> Self {
        InMemoryLedger {
            notary,
            contract,
            transactions: HashMap::new(),
            outputs: HashMap::new(),
            consumed: HashMap::new(),
            commit_order: Vec::new(),
        }
    }

    pub fn notary(&self) -> &PartyRef {
        self.notary.party()
    }

    pub fn contract(&self) -> &AssetContract {
        &self.contract
    }

    /// Look up a committed transaction
    pub fn transaction(&self, id: &TransactionId) -> Option<&FinalizedTransaction> {
        self.transactions.get(id)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Transaction that consumed `state_ref`, if any
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<TransactionId> {
        self.consumed.get(state_ref).copied()
    }
}

impl FinalityService for InMemoryLedger {
    fn submit_and_finalize(
        &mut self,
        tx: SignedTransaction,
    ) -> Result<FinalizedTransaction, FinalizationError> {
        let ledger_tx = check_transaction(
            self.notary.party(),
            &self.contract,
            &tx,
            SystemTime::now(),
            |state_ref| self.outputs.get(state_ref).cloned(),
        )?;

        for input in &ledger_tx.inputs {
            if let Some(consumed_by) = self.consumed.get(&input.state_ref) {
                return Err(FinalizationError::double_spend(input.state_ref, *consumed_by));
            }
        }

        let id = ledger_tx.id;
        for input in &ledger_tx.inputs {
            self.consumed.insert(input.state_ref, id);
        }
        for index in 0..tx.tx.outputs().len() as u32 {
            if let Some(output) = tx.tx.out_ref(index) {
                self.commit_order.push(output.state_ref);
                self.outputs.insert(output.state_ref, output);
            }
        }

        let finalized = self.notary.finalize(tx);
        self.transactions.insert(id, finalized.clone());

        info!(
            tx = %id,
            inputs = ledger_tx.inputs.len(),
            outputs = ledger_tx.outputs.len(),
            "Transaction committed to ledger"
        );
        debug!(committed = self.transactions.len(), "Ledger size");

        Ok(finalized)
    }
}

impl Vault for InMemoryLedger {
    fn unconsumed_titles(&self) -> Vec<StateAndRef> {
        self.commit_order
            .iter()
            .filter(|state_ref| !self.consumed.contains_key(*state_ref))
            .filter_map(|state_ref| self.outputs.get(state_ref))
            .filter(|state| state.asset().is_some())
            .cloned()
            .collect()
    }
}

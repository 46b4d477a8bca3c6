//! Title flows
//!
//! This module provides the flows that assemble, sign and finalize title
//! transactions against a synchronous finality service:
//!
//! - [`IssueTitleFlow`]: issue a title, then immediately move it to a recipient
//! - [`TransferTitleFlow`]: move a title already held in the vault
//!
//! The issue flow runs two phases strictly in order:
//!
//! ```text
//! Issuing ──finalized──> Moving ──finalized──> done
//!    │                      │
//!    └─ error: nothing      └─ error: TransferIncomplete
//!       committed              (issuance stays on ledger)
//! ```
//!
//! Neither phase is retried. Submitting the same inputs twice is never safe.

use crate::core::builder::TransactionBuilder;
use crate::core::contract::AssetContract;
use crate::core::traits::{FinalityService, IdentityService, KeyManagement, Vault};
use crate::types::{
    AssetState, Command, FinalizedTransaction, LedgerError, PartyRef, SignedTransaction,
    StateAndRef, StateData, WireTransaction,
};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Sign a transaction as the local node
///
/// Signs with this node's own key and with every command signer key held
/// locally. Keys held elsewhere are left for the finality service to report
/// as missing.
pub fn sign_initial_transaction<S>(services: &S, tx: WireTransaction) -> SignedTransaction
where
    S: IdentityService + KeyManagement,
{
    let mut keys = tx.required_signing_keys();
    keys.insert(services.me().owning_key);

    let mut signed = SignedTransaction::new(tx);
    for key in keys {
        if let Some(sig) = services.sign(&signed.tx, &key) {
            signed = signed.with_signature(sig);
        }
    }
    signed
}

/// Verify locally, sign and submit a builder's transaction
fn finalize<S, F>(
    services: &S,
    finality: &mut F,
    contract: &AssetContract,
    builder: &TransactionBuilder,
) -> Result<FinalizedTransaction, LedgerError>
where
    S: IdentityService + KeyManagement,
    F: FinalityService,
{
    contract.verify(&builder.to_ledger_transaction())?;
    let signed = sign_initial_transaction(services, builder.to_wire_transaction());
    Ok(finality.submit_and_finalize(signed)?)
}

/// Build an issuance of `state` and the key set that must sign it
pub(crate) fn build_issuance(
    me: &PartyRef,
    notary: PartyRef,
    contract: &AssetContract,
    state: AssetState,
    time_window: Duration,
) -> TransactionBuilder {
    let mut signers = vec![me.owning_key];
    if contract.requires_issuer_signature() {
        signers.push(state.issuer.owning_key);
    }

    let mut builder = TransactionBuilder::new(notary);
    builder
        .add_output_state(StateData::Asset(state), contract.id().clone())
        .add_command(Command::Issue, signers)
        .set_time_window(SystemTime::now(), time_window);
    builder
}

/// Pick the one unconsumed title called `asset_id`
pub(crate) fn single_title(
    mut held: Vec<StateAndRef>,
    asset_id: &str,
) -> Result<StateAndRef, LedgerError> {
    match held.len() {
        0 => Err(LedgerError::asset_not_found(asset_id)),
        1 => Ok(held.remove(0)),
        count => Err(LedgerError::asset_not_unique(asset_id, count)),
    }
}

/// Issue a title and move it to a recipient
pub struct IssueTitleFlow<'a, S, F> {
    services: &'a S,
    finality: &'a mut F,
    contract: &'a AssetContract,
    time_window: Duration,
}

impl<'a, S, F> IssueTitleFlow<'a, S, F>
where
    S: IdentityService + KeyManagement,
    F: FinalityService,
{
    /// Create the flow
    ///
    /// # Arguments
    ///
    /// * `services` - Identity and key services of the node running the flow
    /// * `finality` - Service the transactions are submitted to
    /// * `contract` - Contract the title is governed by
    /// * `time_window` - Validity window for the issuance
    pub fn new(
        services: &'a S,
        finality: &'a mut F,
        contract: &'a AssetContract,
        time_window: Duration,
    ) -> Self {
        IssueTitleFlow {
            services,
            finality,
            contract,
            time_window,
        }
    }

    /// Issue `state`, then move it to `recipient`
    ///
    /// # Returns
    ///
    /// The finalized move transaction.
    ///
    /// # Errors
    ///
    /// - `NoNotary` if no notary is registered
    /// - Any verification or finalization error from the issuance; nothing
    ///   is committed in that case
    /// - `TransferIncomplete` if the issuance was committed but the move
    ///   failed
    pub fn call(
        &mut self,
        state: AssetState,
        recipient: PartyRef,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let notary = self.services.current_notary().ok_or(LedgerError::NoNotary)?;
        let asset_id = state.asset_id.clone();

        info!(step = "Issuing", title = %asset_id, "Issuing and timestamping title");
        let builder = build_issuance(
            &self.services.me(),
            notary.clone(),
            self.contract,
            state,
            self.time_window,
        );
        let issuance = finalize(self.services, self.finality, self.contract, &builder)?;

        info!(step = "Moving", title = %asset_id, to = %recipient, "Moving title to recipient");
        match self.move_issued(&issuance, notary, recipient) {
            Ok(moved) => Ok(moved),
            Err(cause) => {
                warn!(
                    title = %asset_id,
                    issuance = %issuance.id(),
                    error = %cause,
                    "Title issued but not transferred"
                );
                Err(LedgerError::transfer_incomplete(issuance.id(), cause))
            }
        }
    }

    fn move_issued(
        &mut self,
        issuance: &FinalizedTransaction,
        notary: PartyRef,
        recipient: PartyRef,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let title = issuance
            .out_ref(0)
            .ok_or_else(|| LedgerError::asset_not_found("issuance output 0"))?;

        let mut builder = TransactionBuilder::new(notary);
        self.contract.generate_move(&mut builder, &title, recipient)?;
        finalize(self.services, self.finality, self.contract, &builder)
    }
}

/// Move a title already held in the vault to a new owner
pub struct TransferTitleFlow<'a, S, F> {
    services: &'a S,
    finality: &'a mut F,
    contract: &'a AssetContract,
}

impl<'a, S, F> TransferTitleFlow<'a, S, F>
where
    S: IdentityService + KeyManagement,
    F: FinalityService + Vault,
{
    pub fn new(services: &'a S, finality: &'a mut F, contract: &'a AssetContract) -> Self {
        TransferTitleFlow {
            services,
            finality,
            contract,
        }
    }

    /// Transfer the unconsumed title `asset_id` to `new_owner`
    ///
    /// # Errors
    ///
    /// - `AssetNotFound` / `AssetNotUnique` if the vault does not hold
    ///   exactly one such title
    /// - Any verification or finalization error from the move
    pub fn call(
        &mut self,
        asset_id: &str,
        new_owner: PartyRef,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let notary = self.services.current_notary().ok_or(LedgerError::NoNotary)?;
        let title = single_title(self.finality.find_title(asset_id), asset_id)?;

        info!(step = "Moving", title = asset_id, to = %new_owner, "Transferring title");
        let mut builder = TransactionBuilder::new(notary);
        self.contract.generate_move(&mut builder, &title, new_owner)?;
        finalize(self.services, self.finality, self.contract, &builder)
    }
}

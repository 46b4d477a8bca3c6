//! Async title flows
//!
//! Same two-phase protocol as [`crate::core::flow`], with finalization going
//! through a [`NotaryClient`] instead of a synchronous service. The issuance
//! must be finalized before the move is built; nothing here runs the two
//! phases concurrently.

use super::NotaryClient;
use crate::core::contract::AssetContract;
use crate::core::flow::{build_issuance, sign_initial_transaction, single_title};
use crate::core::traits::{IdentityService, KeyManagement, Vault};
use crate::core::TransactionBuilder;
use crate::types::{AssetState, FinalizedTransaction, LedgerError, PartyRef};
use std::time::Duration;
use tracing::{info, warn};

async fn finalize<S>(
    services: &S,
    notary: &NotaryClient,
    contract: &AssetContract,
    builder: &TransactionBuilder,
) -> Result<FinalizedTransaction, LedgerError>
where
    S: IdentityService + KeyManagement,
{
    contract.verify(&builder.to_ledger_transaction())?;
    let signed = sign_initial_transaction(services, builder.to_wire_transaction());
    Ok(notary.submit_and_finalize(signed).await?)
}

/// Issue a title and move it to a recipient through the notary actor
pub struct AsyncIssueTitleFlow<'a, S> {
    services: &'a S,
    notary: &'a NotaryClient,
    contract: &'a AssetContract,
    time_window: Duration,
}

impl<'a, S> AsyncIssueTitleFlow<'a, S>
where
    S: IdentityService + KeyManagement + Sync,
{
    pub fn new(
        services: &'a S,
        notary: &'a NotaryClient,
        contract: &'a AssetContract,
        time_window: Duration,
    ) -> Self {
        Self {
            services,
            notary,
            contract,
            time_window,
        }
    }

    /// Issue `state`, then move it to `recipient`
    ///
    /// # Errors
    ///
    /// Same as the synchronous flow, plus `Timeout` and `Cancelled` from the
    /// notary client. A timeout during the move still yields
    /// `TransferIncomplete`.
    pub async fn call(
        &self,
        state: AssetState,
        recipient: PartyRef,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let notary_party = self.services.current_notary().ok_or(LedgerError::NoNotary)?;
        let asset_id = state.asset_id.clone();

        info!(step = "Issuing", title = %asset_id, "Issuing and timestamping title");
        let builder = build_issuance(
            &self.services.me(),
            notary_party.clone(),
            self.contract,
            state,
            self.time_window,
        );
        let issuance = finalize(self.services, self.notary, self.contract, &builder).await?;

        info!(step = "Moving", title = %asset_id, to = %recipient, "Moving title to recipient");
        let moved = match issuance.out_ref(0) {
            Some(title) => {
                let mut builder = TransactionBuilder::new(notary_party);
                match self.contract.generate_move(&mut builder, &title, recipient) {
                    Ok(()) => finalize(self.services, self.notary, self.contract, &builder).await,
                    Err(e) => Err(e.into()),
                }
            }
            None => Err(LedgerError::asset_not_found("issuance output 0")),
        };

        moved.map_err(|cause| {
            warn!(
                title = %asset_id,
                issuance = %issuance.id(),
                error = %cause,
                "Title issued but not transferred"
            );
            LedgerError::transfer_incomplete(issuance.id(), cause)
        })
    }
}

/// Move a held title to a new owner through the notary actor
pub struct AsyncTransferTitleFlow<'a, S, V> {
    services: &'a S,
    vault: &'a V,
    notary: &'a NotaryClient,
    contract: &'a AssetContract,
}

impl<'a, S, V> AsyncTransferTitleFlow<'a, S, V>
where
    S: IdentityService + KeyManagement + Sync,
    V: Vault + Sync,
{
    pub fn new(
        services: &'a S,
        vault: &'a V,
        notary: &'a NotaryClient,
        contract: &'a AssetContract,
    ) -> Self {
        Self {
            services,
            vault,
            notary,
            contract,
        }
    }

    pub async fn call(
        &self,
        asset_id: &str,
        new_owner: PartyRef,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let notary_party = self.services.current_notary().ok_or(LedgerError::NoNotary)?;
        let title = single_title(self.vault.find_title(asset_id), asset_id)?;

        info!(step = "Moving", title = asset_id, to = %new_owner, "Transferring title");
        let mut builder = TransactionBuilder::new(notary_party);
        self.contract.generate_move(&mut builder, &title, new_owner)?;
        finalize(self.services, self.notary, self.contract, &builder).await
    }
}

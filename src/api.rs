//! Request/response façade over the title flows
//!
//! Mirrors the operations a node exposes to its users: who-am-I, known peers,
//! held titles, issue-title and transfer-title. Commands return an
//! [`ApiResponse`]; a failure is never reported as an empty success.
//!
//! Two flavours share the same surface:
//!
//! - [`LandTitleApi`]: owns a `NetworkMap` and an `InMemoryLedger`, `&mut self`
//! - [`AsyncLandTitleApi`]: shares an `AsyncLedger` through a notary actor, `&self`

use crate::core::config::LedgerConfig;
use crate::core::contract::AssetContract;
use crate::core::flow::{IssueTitleFlow, TransferTitleFlow};
use crate::core::identity::NetworkMap;
use crate::core::ledger::InMemoryLedger;
use crate::core::notary::NotaryIdentity;
use crate::core::r#async::{
    AsyncIssueTitleFlow, AsyncLedger, AsyncTransferTitleFlow, NotaryClient, NotaryService,
};
use crate::core::traits::{IdentityService, Vault};
use crate::types::{
    AssetState, FinalizedTransaction, LedgerError, Operation, PartyRef, StateAndRef,
};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// Outcome class of a façade command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Created,
    BadRequest,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Created => write!(f, "201 Created"),
            ResponseStatus::BadRequest => write!(f, "400 Bad Request"),
        }
    }
}

/// Status plus a human-readable body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    pub body: String,
}

impl ApiResponse {
    pub fn created(tx: &FinalizedTransaction) -> Self {
        Self {
            status: ResponseStatus::Created,
            body: format!("Transaction id {} committed to ledger.", tx.id()),
        }
    }

    pub fn bad_request(error: &LedgerError) -> Self {
        Self {
            status: ResponseStatus::BadRequest,
            body: error.to_string(),
        }
    }

    fn from_result(result: Result<FinalizedTransaction, LedgerError>) -> Self {
        match result {
            Ok(tx) => Self::created(&tx),
            Err(e) => {
                error!(error = %e, "Request failed");
                Self::bad_request(&e)
            }
        }
    }
}

fn resolve<S: IdentityService>(services: &S, name: &str) -> Result<PartyRef, LedgerError> {
    services
        .resolve_party(name)
        .ok_or_else(|| LedgerError::unknown_party(name))
}

/// Notary identity for the network's current notary, if this process holds its key
fn hosted_notary(network: &NetworkMap) -> Result<NotaryIdentity, LedgerError> {
    let party = network.current_notary().ok_or(LedgerError::NoNotary)?;
    let key = network
        .signing_key(&party.owning_key)
        .cloned()
        .ok_or(LedgerError::NoNotary)?;
    Ok(NotaryIdentity::new(&party.name, key))
}

/// Single-threaded façade
#[derive(Debug)]
pub struct LandTitleApi {
    network: NetworkMap,
    ledger: InMemoryLedger,
    contract: AssetContract,
    config: LedgerConfig,
}

impl LandTitleApi {
    /// Create a façade whose ledger is notarised by the network's current notary
    ///
    /// # Errors
    ///
    /// Returns `NoNotary` if the network has no notary hosted in this process.
    pub fn new(network: NetworkMap, config: LedgerConfig) -> Result<Self, LedgerError> {
        let contract = config.contract();
        let ledger = InMemoryLedger::new(hosted_notary(&network)?, contract.clone());
        Ok(Self {
            network,
            ledger,
            contract,
            config,
        })
    }

    pub fn network(&self) -> &NetworkMap {
        &self.network
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Legal name of this node
    pub fn whoami(&self) -> String {
        self.network.me().name
    }

    /// Names of every known party except this node and notaries
    pub fn peers(&self) -> Vec<String> {
        self.network.peers().into_iter().map(|p| p.name).collect()
    }

    /// Every unconsumed title
    pub fn titles(&self) -> Vec<StateAndRef> {
        self.ledger.unconsumed_titles()
    }

    /// Issue title `id` owned by `owner`, then move it to `recipient`
    pub fn issue(
        &mut self,
        id: &str,
        owner: &str,
        issuer: &str,
        recipient: &str,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let owner = resolve(&self.network, owner)?;
        let issuer = resolve(&self.network, issuer)?;
        let recipient = resolve(&self.network, recipient)?;

        IssueTitleFlow::new(
            &self.network,
            &mut self.ledger,
            &self.contract,
            self.config.time_window,
        )
        .call(AssetState::new(id, issuer, owner), recipient)
    }

    /// Move held title `id` to `new_owner`
    pub fn transfer(
        &mut self,
        id: &str,
        new_owner: &str,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let new_owner = resolve(&self.network, new_owner)?;
        TransferTitleFlow::new(&self.network, &mut self.ledger, &self.contract).call(id, new_owner)
    }

    /// Run one batch operation
    pub fn apply(&mut self, operation: &Operation) -> Result<FinalizedTransaction, LedgerError> {
        match operation {
            Operation::Issue {
                title,
                issuer,
                owner,
                recipient,
            } => self.issue(title, owner, issuer, recipient),
            Operation::Transfer { title, new_owner } => self.transfer(title, new_owner),
        }
    }

    pub fn issue_title(
        &mut self,
        id: &str,
        owner: &str,
        issuer: &str,
        recipient: &str,
    ) -> ApiResponse {
        ApiResponse::from_result(self.issue(id, owner, issuer, recipient))
    }

    pub fn transfer_title(&mut self, id: &str, new_owner: &str) -> ApiResponse {
        ApiResponse::from_result(self.transfer(id, new_owner))
    }
}

/// Concurrent façade
///
/// Cloning is cheap; every clone talks to the same ledger and notary actor.
#[derive(Debug, Clone)]
pub struct AsyncLandTitleApi {
    network: Arc<NetworkMap>,
    ledger: Arc<AsyncLedger>,
    notary: NotaryClient,
    contract: AssetContract,
    config: LedgerConfig,
}

impl AsyncLandTitleApi {
    /// Start a notary actor on the current runtime and build a façade over it
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// The façade and the notary task's handle. The task ends once every
    /// clone of the façade has been dropped.
    pub fn spawn(
        network: NetworkMap,
        config: LedgerConfig,
        queue_capacity: usize,
    ) -> Result<(Self, JoinHandle<()>), LedgerError> {
        let contract = config.contract();
        let ledger = Arc::new(AsyncLedger::new(hosted_notary(&network)?, contract.clone()));
        let (notary, handle) =
            NotaryService::spawn(Arc::clone(&ledger), queue_capacity, config.finality_timeout);

        let api = Self {
            network: Arc::new(network),
            ledger,
            notary,
            contract,
            config,
        };
        Ok((api, handle))
    }

    pub fn ledger(&self) -> &AsyncLedger {
        &self.ledger
    }

    pub fn whoami(&self) -> String {
        self.network.me().name
    }

    pub fn peers(&self) -> Vec<String> {
        self.network.peers().into_iter().map(|p| p.name).collect()
    }

    pub fn titles(&self) -> Vec<StateAndRef> {
        self.ledger.unconsumed_titles()
    }

    pub async fn issue(
        &self,
        id: &str,
        owner: &str,
        issuer: &str,
        recipient: &str,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let owner = resolve(self.network.as_ref(), owner)?;
        let issuer = resolve(self.network.as_ref(), issuer)?;
        let recipient = resolve(self.network.as_ref(), recipient)?;

        AsyncIssueTitleFlow::new(
            self.network.as_ref(),
            &self.notary,
            &self.contract,
            self.config.time_window,
        )
        .call(AssetState::new(id, issuer, owner), recipient)
        .await
    }

    pub async fn transfer(
        &self,
        id: &str,
        new_owner: &str,
    ) -> Result<FinalizedTransaction, LedgerError> {
        let new_owner = resolve(self.network.as_ref(), new_owner)?;
        AsyncTransferTitleFlow::new(
            self.network.as_ref(),
            self.ledger.as_ref(),
            &self.notary,
            &self.contract,
        )
        .call(id, new_owner)
        .await
    }

    pub async fn apply(&self, operation: &Operation) -> Result<FinalizedTransaction, LedgerError> {
        match operation {
            Operation::Issue {
                title,
                issuer,
                owner,
                recipient,
            } => self.issue(title, owner, issuer, recipient).await,
            Operation::Transfer { title, new_owner } => self.transfer(title, new_owner).await,
        }
    }

    pub async fn issue_title(
        &self,
        id: &str,
        owner: &str,
        issuer: &str,
        recipient: &str,
    ) -> ApiResponse {
        ApiResponse::from_result(self.issue(id, owner, issuer, recipient).await)
    }

    pub async fn transfer_title(&self, id: &str, new_owner: &str) -> ApiResponse {
        ApiResponse::from_result(self.transfer(id, new_owner).await)
    }
}

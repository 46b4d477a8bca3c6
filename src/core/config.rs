//! Ledger configuration
//!
//! Everything a flow or contract would otherwise read from a global is
//! carried here and passed in at construction.

use crate::core::contract::{AssetContract, MoveAuthorization, DEFAULT_CONTRACT_ID};
use crate::core::identity::NetworkMap;
use crate::types::ContractId;
use std::time::Duration;

/// Settings shared by contracts, flows and the notary client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Id tagged onto every title output
    pub contract_id: String,
    /// Validity window given to issuances
    pub time_window: Duration,
    /// Whose signature authorizes a move
    pub move_authorization: MoveAuthorization,
    /// Whether issuances must be signed by the title's issuer
    pub require_issuer_signature: bool,
    /// How long the async notary client waits for an answer
    pub finality_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            contract_id: DEFAULT_CONTRACT_ID.to_string(),
            time_window: Duration::from_secs(30),
            move_authorization: MoveAuthorization::CurrentOwner,
            require_issuer_signature: false,
            finality_timeout: Duration::from_secs(10),
        }
    }
}

impl LedgerConfig {
    /// Build the contract these settings describe
    pub fn contract(&self) -> AssetContract {
        AssetContract::new(
            ContractId::new(self.contract_id.clone()),
            self.move_authorization,
            self.require_issuer_signature,
        )
    }
}

/// Who is on the simulated network
///
/// Every name is hosted in this process, so the node can sign for all of
/// them. Names must be distinct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Legal name of the node running the flows
    pub me: String,
    /// Other parties that can issue, hold and receive titles
    pub parties: Vec<String>,
    /// Legal name of the notary
    pub notary: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            me: "PartyA".to_string(),
            parties: vec!["PartyB".to_string(), "PartyC".to_string()],
            notary: "Notary".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Register every configured party and the notary in a fresh map
    pub fn build(&self) -> NetworkMap {
        let mut network = NetworkMap::new(&self.me);
        for party in &self.parties {
            network.register_party(party);
        }
        network.register_notary(&self.notary);
        network
    }
}

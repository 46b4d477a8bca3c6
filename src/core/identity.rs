//! In-memory network map
//!
//! Stands in for the platform's identity and key management services. Every
//! party in a simulated network lives in one process, so the map can hold
//! signing keys for them all. Parties registered with
//! [`NetworkMap::register_remote_party`] are known by key only and can never
//! be signed for locally.

use crate::core::traits::{IdentityService, KeyManagement};
use crate::types::{PartyRef, PublicKey, TransactionSignature, WireTransaction};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Registry of parties, notaries and the keys this node can sign with
#[derive(Debug)]
pub struct NetworkMap {
    me: PartyRef,
    parties: BTreeMap<String, PartyRef>,
    notaries: Vec<PartyRef>,
    keys: HashMap<PublicKey, SigningKey>,
}

impl NetworkMap {
    /// Create a map whose local node is called `me`
    pub fn new(me: &str) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let me_party = PartyRef::new(me, PublicKey::from(key.verifying_key()));

        let mut map = NetworkMap {
            me: me_party.clone(),
            parties: BTreeMap::new(),
            notaries: Vec::new(),
            keys: HashMap::new(),
        };
        map.keys.insert(me_party.owning_key, key);
        map.parties.insert(me.to_string(), me_party);
        map
    }

    /// Register a party hosted in this process, generating its key
    ///
    /// Registering a name twice returns the existing party.
    pub fn register_party(&mut self, name: &str) -> PartyRef {
        if let Some(existing) = self.parties.get(name) {
            return existing.clone();
        }

        let key = SigningKey::generate(&mut OsRng);
        let party = PartyRef::new(name, PublicKey::from(key.verifying_key()));
        debug!(party = name, key = %party.owning_key, "Registered party");

        self.keys.insert(party.owning_key, key);
        self.parties.insert(name.to_string(), party.clone());
        party
    }

    /// Register a party known only by its public key
    pub fn register_remote_party(&mut self, name: &str, key: PublicKey) -> PartyRef {
        let party = PartyRef::new(name, key);
        self.parties.insert(name.to_string(), party.clone());
        party
    }

    /// Register a notary hosted in this process
    ///
    /// The first notary registered becomes the current notary.
    pub fn register_notary(&mut self, name: &str) -> PartyRef {
        let party = self.register_party(name);
        if !self.notaries.contains(&party) {
            self.notaries.push(party.clone());
        }
        party
    }

    /// Private key for `key`, if held locally
    pub fn signing_key(&self, key: &PublicKey) -> Option<&SigningKey> {
        self.keys.get(key)
    }

    pub fn notaries(&self) -> &[PartyRef] {
        &self.notaries
    }
}

impl IdentityService for NetworkMap {
    fn resolve_party(&self, name: &str) -> Option<PartyRef> {
        self.parties.get(name).cloned()
    }

    fn current_notary(&self) -> Option<PartyRef> {
        self.notaries.first().cloned()
    }

    fn me(&self) -> PartyRef {
        self.me.clone()
    }

    fn peers(&self) -> Vec<PartyRef> {
        self.parties
            .values()
            .filter(|party| **party != self.me && !self.notaries.contains(*party))
            .cloned()
            .collect()
    }
}

impl KeyManagement for NetworkMap {
    fn sign(&self, tx: &WireTransaction, key: &PublicKey) -> Option<TransactionSignature> {
        self.keys
            .get(key)
            .map(|signing_key| TransactionSignature::sign(signing_key, &tx.id()))
    }
}

//! Party identities for the land title ledger
//!
//! A party is a legal name bound to an ed25519 owning key. All comparisons
//! between parties go through the key: two references with the same key are
//! the same party regardless of the name they were looked up by.

use ed25519_dalek::VerifyingKey;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Raw ed25519 verifying key bytes
///
/// Stored as bytes rather than `VerifyingKey` so it can be ordered and used
/// as a `BTreeSet` member.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode into a verifying key
    ///
    /// Returns `None` if the bytes are not a valid curve point.
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).ok()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        PublicKey(key.to_bytes())
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        PublicKey(key.to_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty to tell keys apart in logs
        write!(f, "PublicKey({}..)", hex::encode(&self.0[..8]))
    }
}

/// Reference to a party on the network
///
/// Carries the legal name for display and the owning key for identity.
#[derive(Clone)]
pub struct PartyRef {
    /// Legal name the party is registered under
    pub name: String,

    /// Key the party signs with
    pub owning_key: PublicKey,
}

impl PartyRef {
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        PartyRef {
            name: name.into(),
            owning_key,
        }
    }
}

impl PartialEq for PartyRef {
    fn eq(&self, other: &Self) -> bool {
        self.owning_key == other.owning_key
    }
}

impl Eq for PartyRef {}

impl Hash for PartyRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owning_key.hash(state);
    }
}

impl PartialOrd for PartyRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartyRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.owning_key.cmp(&other.owning_key)
    }
}

impl fmt::Display for PartyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for PartyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyRef({}, {:?})", self.name, self.owning_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_equality_uses_key_only() {
        let key = PublicKey::from_bytes([7u8; 32]);
        let a = PartyRef::new("Alice", key);
        let b = PartyRef::new("Alice Ltd", key);
        let c = PartyRef::new("Alice", PublicKey::from_bytes([8u8; 32]));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_public_key_display_is_hex() {
        let key = PublicKey::from_bytes([0xab; 32]);
        assert_eq!(key.to_string(), "ab".repeat(32));
    }
}

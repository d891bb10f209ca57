use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix for account identifiers derived from a verifying key.
const ACCOUNT_PREFIX: char = 'p';

/// Identifier of an account on the target chain.
///
/// Kept as a free-form string: the transfer-target input of the panel is
/// free text, so validation happens at the chain boundary, not here. The
/// empty string is the "no account" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// The "no account" sentinel.
    pub fn empty() -> Self {
        AccountId(String::new())
    }

    /// Derive the canonical identifier for a verifying key: the prefix
    /// character followed by the lowercase hex of the 32 key bytes.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut encoded = String::with_capacity(1 + 64);
        encoded.push(ACCOUNT_PREFIX);
        encoded.push_str(&hex::encode(key.as_bytes()));
        AccountId(encoded)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        AccountId(value.to_string())
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        AccountId(value)
    }
}

/// Signing identity used when submitting claim transactions.
#[derive(Clone)]
pub struct AccountPair {
    id: AccountId,
    signing_key: SigningKey,
}

impl AccountPair {
    /// Generate a fresh keypair with an identifier derived from its
    /// verifying key.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let id = AccountId::from_verifying_key(&signing_key.verifying_key());
        AccountPair { id, signing_key }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for AccountPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountPair").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn derived_id_has_prefix_and_hex_payload() {
        let pair = AccountPair::generate();
        let id = pair.id().as_str();
        assert_eq!(id.len(), 65);
        assert!(id.starts_with(ACCOUNT_PREFIX));
        assert!(hex::decode(&id[1..]).is_ok());
    }

    #[test]
    fn same_key_same_id() {
        let pair = AccountPair::generate();
        let again = AccountPair::from_signing_key(pair.signing_key.clone());
        assert_eq!(pair.id(), again.id());
    }

    #[test]
    fn signatures_verify_against_verifying_key() {
        let pair = AccountPair::generate();
        let message = b"createClaim\0abc";
        let signature = pair.sign(message);
        assert!(pair.verifying_key().verify(message, &signature).is_ok());
        assert!(pair.verifying_key().verify(b"tampered", &signature).is_err());
    }

    #[test]
    fn empty_sentinel() {
        assert!(AccountId::empty().is_empty());
        assert!(!AccountId::new("alice").is_empty());
    }
}

//! Shared data model for the Proofmark claim toolkit.
//!
//! Defines the fingerprint and account identifier newtypes, the on-chain
//! claim record with its zero-block sentinel, and the claim action names
//! used on the transaction boundary.

pub mod account;
pub mod claim;
pub mod fingerprint;

pub use account::{AccountId, AccountPair};
pub use claim::{BlockNumber, ClaimAction, ClaimRecord, NO_CLAIM_BLOCK};
pub use fingerprint::{Fingerprint, FingerprintError, FINGERPRINT_BYTES};

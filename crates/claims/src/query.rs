//! Boundary to on-chain claim storage: keyed lookup plus live subscription.

use proofmark_types::{ClaimRecord, Fingerprint};
use std::sync::Arc;
use thiserror::Error;

/// Opaque handle identifying one live claim subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Callback invoked with the subscribed fingerprint and its latest record.
pub type RecordCallback = Arc<dyn Fn(&Fingerprint, ClaimRecord) + Send + Sync>;

/// Errors from the claim query boundary.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The subscription could not be established. Terminal for the attempt;
    /// callers surface this as a warning and never retry automatically.
    #[error("subscription setup failed: {reason}")]
    SetupFailed { reason: String },
}

/// Live view into on-chain claim storage, keyed by fingerprint.
///
/// A successful `subscribe` delivers the current record immediately, then
/// every subsequent change in chain order. No ordering is guaranteed across
/// different fingerprints' subscriptions.
pub trait ClaimQuery: Send + Sync {
    fn subscribe(
        &self,
        fingerprint: &Fingerprint,
        on_update: RecordCallback,
    ) -> Result<SubscriptionHandle, QueryError>;

    /// Stop delivery for `handle`. Delivery ceases strictly before this
    /// returns; releasing an already-released handle is a no-op.
    fn release(&self, handle: SubscriptionHandle);
}

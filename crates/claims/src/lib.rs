//! Claim-state projection for Proofmark
//!
//! The projector is the one component with a lifecycle worth guaranteeing:
//! it keeps exactly one live subscription to on-chain claim storage for the
//! latest fingerprint, discards stale callbacks, and derives the enabled
//! action set from a single consolidated state value. The chain itself sits
//! behind the [`ClaimQuery`] and [`TransactionDispatcher`] traits;
//! [`MemoryClaimChain`] implements both for testing and small deployments.

pub mod chain;
pub mod dispatch;
pub mod projector;
pub mod query;

pub use chain::MemoryClaimChain;
pub use dispatch::{encode_call, StatusCallback, TransactionDispatcher};
pub use projector::{ActionSet, ClaimStateProjector, ProjectedState, ProjectorError};
pub use query::{ClaimQuery, QueryError, RecordCallback, SubscriptionHandle};

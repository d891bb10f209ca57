//! Boundary to transaction signing and submission.

use proofmark_types::{AccountPair, ClaimAction};
use std::sync::Arc;

/// Callback receiving opaque, purely informational status text.
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Signs and submits a claim transaction.
///
/// Fire-and-forget: callers never await completion and never interpret the
/// status text. The eventual chain-state change is observed only through a
/// [`crate::ClaimQuery`] subscription.
pub trait TransactionDispatcher: Send + Sync {
    fn submit(
        &self,
        action: ClaimAction,
        params: Vec<String>,
        signer: &AccountPair,
        on_status: StatusCallback,
    );
}

/// Canonical byte encoding of a call for signing: the call name followed by
/// each parameter, each preceded by a NUL separator.
pub fn encode_call(action: ClaimAction, params: &[String]) -> Vec<u8> {
    let mut payload = action.call_name().as_bytes().to_vec();
    for param in params {
        payload.push(0);
        payload.extend_from_slice(param.as_bytes());
    }
    payload
}

//! In-memory claim chain, for testing and small deployments.
//!
//! Implements both sides of the chain boundary: subscription-based claim
//! lookup ([`ClaimQuery`]) and signed transaction application
//! ([`TransactionDispatcher`]). Blocks are a monotone counter starting at 1;
//! every applied transaction lands in its own block.

use crate::dispatch::{encode_call, StatusCallback, TransactionDispatcher};
use crate::query::{ClaimQuery, QueryError, RecordCallback, SubscriptionHandle};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use parking_lot::{Mutex, RwLock};
use proofmark_types::{AccountId, AccountPair, ClaimAction, ClaimRecord, Fingerprint};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

struct Subscriber {
    fingerprint: Fingerprint,
    on_update: RecordCallback,
}

struct ChainInner {
    records: RwLock<HashMap<Fingerprint, ClaimRecord>>,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_handle: Mutex<u64>,
    next_block: Mutex<u64>,
    fail_subscriptions: Mutex<bool>,
}

/// In-memory claim chain backend.
#[derive(Clone)]
pub struct MemoryClaimChain {
    inner: Arc<ChainInner>,
}

impl MemoryClaimChain {
    pub fn new() -> Self {
        MemoryClaimChain {
            inner: Arc::new(ChainInner {
                records: RwLock::new(HashMap::new()),
                subscribers: RwLock::new(HashMap::new()),
                next_handle: Mutex::new(1),
                next_block: Mutex::new(1),
                fail_subscriptions: Mutex::new(false),
            }),
        }
    }

    /// Make every subsequent `subscribe` fail, to exercise setup-failure
    /// paths in callers.
    pub fn set_fail_subscriptions(&self, fail: bool) {
        *self.inner.fail_subscriptions.lock() = fail;
    }

    /// Current record for `fingerprint`; the sentinel if no claim exists.
    pub fn record(&self, fingerprint: &Fingerprint) -> ClaimRecord {
        self.inner
            .records
            .read()
            .get(fingerprint)
            .cloned()
            .unwrap_or_else(ClaimRecord::none)
    }

    /// Number of live subscriptions.
    pub fn live_subscriptions(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    fn allocate_block(&self) -> u64 {
        let mut next = self.inner.next_block.lock();
        let block = *next;
        *next += 1;
        block
    }

    fn notify(&self, fingerprint: &Fingerprint, record: &ClaimRecord) {
        // Collect callbacks first so none are invoked under the lock.
        let callbacks: Vec<RecordCallback> = self
            .inner
            .subscribers
            .read()
            .values()
            .filter(|sub| sub.fingerprint == *fingerprint)
            .map(|sub| Arc::clone(&sub.on_update))
            .collect();
        for callback in callbacks {
            callback(fingerprint, record.clone());
        }
    }

    /// Apply a pre-signed call. The signature must cover
    /// [`encode_call`]`(action, params)` and verify under `verifying_key`;
    /// otherwise the call is rejected via status text.
    pub fn apply_signed(
        &self,
        action: ClaimAction,
        params: &[String],
        signer: &AccountId,
        verifying_key: &VerifyingKey,
        signature: &Signature,
        on_status: &StatusCallback,
    ) {
        let payload = encode_call(action, params);
        if verifying_key.verify(&payload, signature).is_err() {
            warn!(%action, "rejecting transaction with invalid signature");
            on_status("Failed: InvalidSignature");
            return;
        }
        let expected_params = match action {
            ClaimAction::TransferClaim => 2,
            _ => 1,
        };
        if params.len() != expected_params {
            on_status("Failed: BadParameters");
            return;
        }
        let fingerprint = match Fingerprint::from_hex(&params[0]) {
            Ok(fp) if !fp.is_empty() => fp,
            _ => {
                on_status("Failed: BadFingerprint");
                return;
            }
        };
        on_status("Submitted");

        match action {
            ClaimAction::CreateClaim => {
                if self.record(&fingerprint).exists() {
                    on_status("Failed: AlreadyClaimed");
                    return;
                }
                let block = self.allocate_block();
                let record = ClaimRecord::new(signer.clone(), block);
                self.inner
                    .records
                    .write()
                    .insert(fingerprint.clone(), record.clone());
                debug!(fingerprint = %fingerprint, block, "claim created");
                on_status(&format!("InBlock #{block}"));
                self.notify(&fingerprint, &record);
                on_status("Finalized");
            }
            ClaimAction::TransferClaim => {
                let current = self.record(&fingerprint);
                if !current.exists() {
                    on_status("Failed: NoSuchClaim");
                    return;
                }
                if current.owner != *signer {
                    on_status("Failed: NotOwner");
                    return;
                }
                let new_owner = AccountId::new(params[1].clone());
                if new_owner.is_empty() {
                    on_status("Failed: BadParameters");
                    return;
                }
                // Ownership changes; the registration block attests to
                // existence and is preserved.
                let record = ClaimRecord::new(new_owner, current.registered_at_block);
                self.inner
                    .records
                    .write()
                    .insert(fingerprint.clone(), record.clone());
                let block = self.allocate_block();
                debug!(fingerprint = %fingerprint, block, "claim transferred");
                on_status(&format!("InBlock #{block}"));
                self.notify(&fingerprint, &record);
                on_status("Finalized");
            }
            ClaimAction::RevokeClaim => {
                let current = self.record(&fingerprint);
                if !current.exists() {
                    on_status("Failed: NoSuchClaim");
                    return;
                }
                if current.owner != *signer {
                    on_status("Failed: NotOwner");
                    return;
                }
                self.inner.records.write().remove(&fingerprint);
                let block = self.allocate_block();
                debug!(fingerprint = %fingerprint, block, "claim revoked");
                on_status(&format!("InBlock #{block}"));
                self.notify(&fingerprint, &ClaimRecord::none());
                on_status("Finalized");
            }
        }
    }
}

impl Default for MemoryClaimChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimQuery for MemoryClaimChain {
    fn subscribe(
        &self,
        fingerprint: &Fingerprint,
        on_update: RecordCallback,
    ) -> Result<SubscriptionHandle, QueryError> {
        if *self.inner.fail_subscriptions.lock() {
            return Err(QueryError::SetupFailed {
                reason: "chain unavailable".to_string(),
            });
        }
        let handle = {
            let mut next = self.inner.next_handle.lock();
            let handle = *next;
            *next += 1;
            handle
        };
        self.inner.subscribers.write().insert(
            handle,
            Subscriber {
                fingerprint: fingerprint.clone(),
                on_update: Arc::clone(&on_update),
            },
        );
        debug!(fingerprint = %fingerprint, handle, "claim subscription opened");
        // The current value is delivered immediately on subscribe.
        on_update(fingerprint, self.record(fingerprint));
        Ok(SubscriptionHandle(handle))
    }

    fn release(&self, handle: SubscriptionHandle) {
        if self.inner.subscribers.write().remove(&handle.0).is_some() {
            debug!(handle = handle.0, "claim subscription released");
        }
    }
}

impl TransactionDispatcher for MemoryClaimChain {
    fn submit(
        &self,
        action: ClaimAction,
        params: Vec<String>,
        signer: &AccountPair,
        on_status: StatusCallback,
    ) {
        let payload = encode_call(action, &params);
        let signature = signer.sign(&payload);
        self.apply_signed(
            action,
            &params,
            signer.id(),
            &signer.verifying_key(),
            &signature,
            &on_status,
        );
    }
}

//! The claim-state projector.
//!
//! Maintains exactly one live [`ProjectedState`] consistent with the latest
//! fingerprint and the latest claim record observed for it. Changing the
//! fingerprint releases the previous subscription before a new one is
//! opened, and record updates for a superseded fingerprint are discarded.

use crate::query::{ClaimQuery, QueryError, RecordCallback, SubscriptionHandle};
use parking_lot::Mutex;
use proofmark_types::{AccountId, BlockNumber, ClaimAction, ClaimRecord, Fingerprint, NO_CLAIM_BLOCK};
use serde::Serialize;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::debug;

/// UI-facing projection of the latest fingerprint and its chain record.
///
/// Owned exclusively by the projector; consumers get snapshots. The owner
/// and registration block are written only by record updates for the
/// currently active fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectedState {
    pub fingerprint: Fingerprint,
    pub owner: AccountId,
    pub registered_at_block: BlockNumber,
    pub transfer_target: AccountId,
}

impl ProjectedState {
    /// Whether the current fingerprint is claimed. The registration block
    /// is the single source of truth for claim status.
    pub fn is_claimed(&self) -> bool {
        self.registered_at_block != NO_CLAIM_BLOCK
    }
}

/// Enabled/disabled action triggers derived from [`ProjectedState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub create: bool,
    pub transfer: bool,
    pub revoke: bool,
}

impl ActionSet {
    pub fn enabled(&self, action: ClaimAction) -> bool {
        match action {
            ClaimAction::CreateClaim => self.create,
            ClaimAction::TransferClaim => self.transfer,
            ClaimAction::RevokeClaim => self.revoke,
        }
    }
}

/// Errors from projector operations.
#[derive(Debug, Error)]
pub enum ProjectorError {
    #[error("claim query setup failed: {0}")]
    QuerySetup(#[from] QueryError),
}

struct ProjectorInner {
    projected: ProjectedState,
    subscription: Option<SubscriptionHandle>,
}

/// Derives UI state from the latest fingerprint and claim record.
pub struct ClaimStateProjector {
    query: Arc<dyn ClaimQuery>,
    inner: Arc<Mutex<ProjectorInner>>,
}

impl ClaimStateProjector {
    /// Create a projector with the empty fingerprint sentinel and no live
    /// subscription.
    pub fn new(query: Arc<dyn ClaimQuery>) -> Self {
        ClaimStateProjector {
            query,
            inner: Arc::new(Mutex::new(ProjectorInner {
                projected: ProjectedState::default(),
                subscription: None,
            })),
        }
    }

    /// Switch the projector to a new fingerprint.
    ///
    /// A call with the current fingerprint is a no-op. Otherwise the
    /// existing subscription is released first, owner and block are reset,
    /// and a new subscription is opened unless `fingerprint` is the empty
    /// sentinel. On [`QueryError`] the state is left at the reset values
    /// and the error is returned; the caller surfaces it, nothing retries.
    pub fn set_fingerprint(&self, fingerprint: Fingerprint) -> Result<(), ProjectorError> {
        let released = {
            let mut inner = self.inner.lock();
            if inner.projected.fingerprint == fingerprint {
                return Ok(());
            }
            inner.projected.owner = AccountId::empty();
            inner.projected.registered_at_block = NO_CLAIM_BLOCK;
            inner.projected.fingerprint = fingerprint.clone();
            inner.subscription.take()
        };
        // Release strictly before any new subscribe: at most one live
        // subscription per projector.
        if let Some(handle) = released {
            self.query.release(handle);
        }
        if fingerprint.is_empty() {
            return Ok(());
        }
        debug!(fingerprint = %fingerprint, "subscribing to claim record");
        let handle = self.query.subscribe(&fingerprint, self.record_callback())?;
        let superseded = {
            let mut inner = self.inner.lock();
            if inner.projected.fingerprint == fingerprint {
                inner.subscription = Some(handle);
                None
            } else {
                Some(handle)
            }
        };
        // A newer set_fingerprint won the race while we were subscribing;
        // its subscription is the live one.
        if let Some(handle) = superseded {
            self.query.release(handle);
        }
        Ok(())
    }

    /// Apply a record update for `fingerprint`.
    ///
    /// Discarded unless `fingerprint` matches the currently active one,
    /// guarding against callbacks delivered across a fingerprint change.
    pub fn on_record_update(&self, fingerprint: &Fingerprint, record: ClaimRecord) {
        apply_record(&self.inner, fingerprint, record);
    }

    /// Store the proposed new owner for a future transfer. Independent of
    /// chain state.
    pub fn set_transfer_target(&self, target: AccountId) {
        self.inner.lock().projected.transfer_target = target;
    }

    pub fn is_claimed(&self) -> bool {
        self.inner.lock().projected.is_claimed()
    }

    /// Derive the enabled action set for `acting`.
    pub fn available_actions(&self, acting: &AccountId) -> ActionSet {
        let inner = self.inner.lock();
        let state = &inner.projected;
        let claimed = state.is_claimed();
        ActionSet {
            create: !claimed && !state.fingerprint.is_empty(),
            transfer: claimed
                && state.owner == *acting
                && !state.transfer_target.is_empty()
                && state.transfer_target != *acting,
            revoke: claimed && state.owner == *acting,
        }
    }

    /// Clone the current projected state for rendering.
    pub fn snapshot(&self) -> ProjectedState {
        self.inner.lock().projected.clone()
    }

    /// Release the live subscription, if any. Idempotent.
    pub fn shutdown(&self) {
        let released = self.inner.lock().subscription.take();
        if let Some(handle) = released {
            self.query.release(handle);
        }
    }

    fn record_callback(&self) -> RecordCallback {
        let weak: Weak<Mutex<ProjectorInner>> = Arc::downgrade(&self.inner);
        Arc::new(move |fingerprint, record| {
            if let Some(inner) = weak.upgrade() {
                apply_record(&inner, fingerprint, record);
            }
        })
    }
}

impl Drop for ClaimStateProjector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply_record(inner: &Arc<Mutex<ProjectorInner>>, fingerprint: &Fingerprint, record: ClaimRecord) {
    let mut guard = inner.lock();
    if guard.projected.fingerprint != *fingerprint {
        debug!(fingerprint = %fingerprint, "discarding stale claim record update");
        return;
    }
    guard.projected.owner = record.owner;
    guard.projected.registered_at_block = record.registered_at_block;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum QueryEvent {
        Subscribe(Fingerprint, u64),
        Release(u64),
    }

    /// Records every subscribe/release and lets tests push record updates
    /// through the stored callbacks.
    struct RecordingQuery {
        events: PlMutex<Vec<QueryEvent>>,
        callbacks: PlMutex<HashMap<u64, (Fingerprint, RecordCallback)>>,
        next_handle: PlMutex<u64>,
        fail_next: PlMutex<bool>,
    }

    impl RecordingQuery {
        fn new() -> Arc<Self> {
            Arc::new(RecordingQuery {
                events: PlMutex::new(Vec::new()),
                callbacks: PlMutex::new(HashMap::new()),
                next_handle: PlMutex::new(1),
                fail_next: PlMutex::new(false),
            })
        }

        fn fail_next_subscribe(&self) {
            *self.fail_next.lock() = true;
        }

        fn events(&self) -> Vec<QueryEvent> {
            self.events.lock().clone()
        }

        fn live_count(&self) -> usize {
            self.callbacks.lock().len()
        }

        fn push_update(&self, fingerprint: &Fingerprint, record: ClaimRecord) {
            let callbacks: Vec<RecordCallback> = self
                .callbacks
                .lock()
                .values()
                .filter(|(fp, _)| fp == fingerprint)
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            for callback in callbacks {
                callback(fingerprint, record.clone());
            }
        }
    }

    impl ClaimQuery for RecordingQuery {
        fn subscribe(
            &self,
            fingerprint: &Fingerprint,
            on_update: RecordCallback,
        ) -> Result<SubscriptionHandle, QueryError> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(QueryError::SetupFailed {
                    reason: "injected".to_string(),
                });
            }
            let handle = {
                let mut next = self.next_handle.lock();
                let handle = *next;
                *next += 1;
                handle
            };
            self.events
                .lock()
                .push(QueryEvent::Subscribe(fingerprint.clone(), handle));
            self.callbacks
                .lock()
                .insert(handle, (fingerprint.clone(), Arc::clone(&on_update)));
            // Immediate delivery of the current (absent) record.
            on_update(fingerprint, ClaimRecord::none());
            Ok(SubscriptionHandle(handle))
        }

        fn release(&self, handle: SubscriptionHandle) {
            self.events.lock().push(QueryEvent::Release(handle.0));
            self.callbacks.lock().remove(&handle.0);
        }
    }

    fn fp(tag: u8) -> Fingerprint {
        Fingerprint::from_digest([tag; 32])
    }

    #[test]
    fn starts_empty_and_unclaimed() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        let state = projector.snapshot();
        assert!(state.fingerprint.is_empty());
        assert!(!projector.is_claimed());
        assert_eq!(query.live_count(), 0);
    }

    #[test]
    fn at_most_one_live_subscription_across_changes() {
        // Release always precedes the next subscribe.
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.set_fingerprint(fp(2)).unwrap();
        projector.set_fingerprint(fp(3)).unwrap();

        assert_eq!(query.live_count(), 1);
        assert_eq!(
            query.events(),
            vec![
                QueryEvent::Subscribe(fp(1), 1),
                QueryEvent::Release(1),
                QueryEvent::Subscribe(fp(2), 2),
                QueryEvent::Release(2),
                QueryEvent::Subscribe(fp(3), 3),
            ]
        );
    }

    #[test]
    fn stale_update_is_discarded() {
        // A late callback for a superseded fingerprint is a no-op.
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.set_fingerprint(fp(2)).unwrap();

        projector.on_record_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 42));

        let state = projector.snapshot();
        assert_eq!(state.fingerprint, fp(2));
        assert!(state.owner.is_empty());
        assert_eq!(state.registered_at_block, NO_CLAIM_BLOCK);
        assert!(!projector.is_claimed());
    }

    #[test]
    fn is_claimed_tracks_registration_block() {
        // Claimed iff block != 0, including immediately after a reset.
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        assert!(!projector.is_claimed());

        projector.on_record_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 42));
        assert!(projector.is_claimed());

        projector.set_fingerprint(fp(2)).unwrap();
        assert!(!projector.is_claimed());
    }

    #[test]
    fn same_fingerprint_is_a_no_op() {
        // Exactly one subscribe, no release pair.
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.set_fingerprint(fp(1)).unwrap();

        assert_eq!(query.events(), vec![QueryEvent::Subscribe(fp(1), 1)]);
    }

    #[test]
    fn unclaimed_fingerprint_enables_create_only() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        projector.set_fingerprint(fp(1)).unwrap();

        let actions = projector.available_actions(&AccountId::new("anyone"));
        assert!(actions.create);
        assert!(!actions.transfer);
        assert!(!actions.revoke);
    }

    #[test]
    fn empty_fingerprint_enables_nothing() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        let actions = projector.available_actions(&AccountId::new("anyone"));
        assert_eq!(actions, ActionSet::default());
    }

    #[test]
    fn owner_gets_transfer_and_revoke_others_get_neither() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        projector.set_fingerprint(fp(1)).unwrap();
        projector.on_record_update(&fp(1), ClaimRecord::new(alice.clone(), 42));

        let state = projector.snapshot();
        assert_eq!(state.owner, alice);
        assert_eq!(state.registered_at_block, 42);

        // No transfer target yet: revoke only.
        let actions = projector.available_actions(&alice);
        assert!(!actions.create);
        assert!(!actions.transfer);
        assert!(actions.revoke);

        projector.set_transfer_target(bob.clone());
        let actions = projector.available_actions(&alice);
        assert!(actions.transfer);
        assert!(actions.revoke);

        let actions = projector.available_actions(&bob);
        assert_eq!(actions, ActionSet::default());
    }

    #[test]
    fn transfer_to_self_stays_disabled() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        let alice = AccountId::new("alice");

        projector.set_fingerprint(fp(1)).unwrap();
        projector.on_record_update(&fp(1), ClaimRecord::new(alice.clone(), 7));
        projector.set_transfer_target(alice.clone());

        assert!(!projector.available_actions(&alice).transfer);
    }

    #[test]
    fn fingerprint_change_releases_then_resubscribes() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.on_record_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 42));
        assert!(projector.is_claimed());

        projector.set_fingerprint(fp(2)).unwrap();

        let state = projector.snapshot();
        assert_eq!(state.fingerprint, fp(2));
        assert!(state.owner.is_empty());
        assert_eq!(state.registered_at_block, NO_CLAIM_BLOCK);
        assert_eq!(query.live_count(), 1);
    }

    #[test]
    fn setup_failure_leaves_state_reset() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.on_record_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 42));

        query.fail_next_subscribe();
        let err = projector.set_fingerprint(fp(2)).unwrap_err();
        assert!(matches!(err, ProjectorError::QuerySetup(_)));

        let state = projector.snapshot();
        assert_eq!(state.fingerprint, fp(2));
        assert!(state.owner.is_empty());
        assert!(!projector.is_claimed());
        // The old subscription was still released.
        assert_eq!(query.live_count(), 0);
    }

    #[test]
    fn empty_sentinel_releases_without_resubscribing() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());

        projector.set_fingerprint(fp(1)).unwrap();
        projector.set_fingerprint(Fingerprint::empty()).unwrap();

        assert_eq!(query.live_count(), 0);
        assert_eq!(
            query.events(),
            vec![QueryEvent::Subscribe(fp(1), 1), QueryEvent::Release(1)]
        );
    }

    #[test]
    fn updates_delivered_through_subscription_apply_in_order() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        projector.set_fingerprint(fp(1)).unwrap();

        query.push_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 10));
        query.push_update(&fp(1), ClaimRecord::new(AccountId::new("carol"), 10));

        assert_eq!(projector.snapshot().owner, AccountId::new("carol"));
    }

    #[test]
    fn drop_releases_the_subscription() {
        let query = RecordingQuery::new();
        {
            let projector = ClaimStateProjector::new(query.clone());
            projector.set_fingerprint(fp(1)).unwrap();
            assert_eq!(query.live_count(), 1);
        }
        assert_eq!(query.live_count(), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        projector.set_fingerprint(fp(1)).unwrap();

        projector.shutdown();
        projector.shutdown();

        assert_eq!(
            query.events(),
            vec![QueryEvent::Subscribe(fp(1), 1), QueryEvent::Release(1)]
        );
    }

    #[test]
    fn transfer_target_survives_record_updates() {
        let query = RecordingQuery::new();
        let projector = ClaimStateProjector::new(query.clone());
        let bob = AccountId::new("bob");

        projector.set_fingerprint(fp(1)).unwrap();
        projector.set_transfer_target(bob.clone());
        projector.on_record_update(&fp(1), ClaimRecord::new(AccountId::new("alice"), 5));

        assert_eq!(projector.snapshot().transfer_target, bob);
    }
}

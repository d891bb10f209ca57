//! The panel itself: event wiring and the rendered view model.

use parking_lot::Mutex;
use proofmark_claims::{
    ActionSet, ClaimQuery, ClaimStateProjector, ProjectorError, StatusCallback,
    TransactionDispatcher,
};
use proofmark_crypto::{DigestComputer, DigestError};
use proofmark_types::{AccountId, AccountPair, BlockNumber, ClaimAction, Fingerprint};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by panel operations. Each is terminal for the attempt;
/// the panel never retries on its own.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error(transparent)]
    Projector(#[from] ProjectorError),
    #[error("action {0} is not available for the acting account")]
    ActionDisabled(ClaimAction),
}

/// Plain-data snapshot of everything the UI renders.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub fingerprint: Fingerprint,
    pub owner: AccountId,
    pub registered_at_block: BlockNumber,
    pub claimed: bool,
    pub actions: ActionSet,
    pub status: String,
}

/// One proof-of-existence panel instance.
///
/// All state is in-memory and rebuilt from the file selection and the chain
/// subscription each session; dropping the panel releases its subscription.
pub struct Panel {
    projector: ClaimStateProjector,
    dispatcher: Arc<dyn TransactionDispatcher>,
    digest: DigestComputer,
    signer: AccountPair,
    status: Arc<Mutex<String>>,
}

impl Panel {
    pub fn new(
        query: Arc<dyn ClaimQuery>,
        dispatcher: Arc<dyn TransactionDispatcher>,
        digest: DigestComputer,
        signer: AccountPair,
    ) -> Self {
        Panel {
            projector: ClaimStateProjector::new(query),
            dispatcher,
            digest,
            signer,
            status: Arc::new(Mutex::new(String::new())),
        }
    }

    /// Handle a file selection: digest the file and point the projector at
    /// the new fingerprint.
    ///
    /// On a read failure the previous fingerprint is kept and the error is
    /// returned after being surfaced in the status line. A subscription
    /// setup failure leaves the projector reset and is surfaced the same
    /// way; neither is retried.
    pub fn select_file(&self, path: &Path) -> Result<(), PanelError> {
        let fingerprint = match self.digest.compute_file(path) {
            Ok(fingerprint) => fingerprint,
            Err(err) => {
                warn!(%err, "file read failed; keeping previous fingerprint");
                self.set_status(format!("File read failed: {err}"));
                return Err(err.into());
            }
        };
        debug!(fingerprint = %fingerprint, "file digested");
        if let Err(err) = self.projector.set_fingerprint(fingerprint) {
            warn!(%err, "claim lookup unavailable");
            self.set_status(format!("Claim lookup unavailable: {err}"));
            return Err(err.into());
        }
        Ok(())
    }

    /// Handle input in the "new owner" text field.
    pub fn set_transfer_target(&self, input: &str) {
        self.projector
            .set_transfer_target(AccountId::new(input.trim()));
    }

    pub fn create_claim(&self) -> Result<(), PanelError> {
        self.trigger(ClaimAction::CreateClaim)
    }

    pub fn transfer_claim(&self) -> Result<(), PanelError> {
        self.trigger(ClaimAction::TransferClaim)
    }

    pub fn revoke_claim(&self) -> Result<(), PanelError> {
        self.trigger(ClaimAction::RevokeClaim)
    }

    /// Render the current state.
    pub fn view(&self) -> PanelView {
        let state = self.projector.snapshot();
        let actions = self.projector.available_actions(self.signer.id());
        PanelView {
            claimed: state.is_claimed(),
            fingerprint: state.fingerprint,
            owner: state.owner,
            registered_at_block: state.registered_at_block,
            actions,
            status: self.status.lock().clone(),
        }
    }

    pub fn status(&self) -> String {
        self.status.lock().clone()
    }

    pub fn signer(&self) -> &AccountPair {
        &self.signer
    }

    fn trigger(&self, action: ClaimAction) -> Result<(), PanelError> {
        let actions = self.projector.available_actions(self.signer.id());
        if !actions.enabled(action) {
            return Err(PanelError::ActionDisabled(action));
        }
        let state = self.projector.snapshot();
        let params = match action {
            ClaimAction::CreateClaim | ClaimAction::RevokeClaim => {
                vec![state.fingerprint.to_string()]
            }
            ClaimAction::TransferClaim => vec![
                state.fingerprint.to_string(),
                state.transfer_target.to_string(),
            ],
        };
        let status = Arc::clone(&self.status);
        let on_status: StatusCallback = Arc::new(move |text| {
            *status.lock() = text.to_string();
        });
        debug!(%action, fingerprint = %state.fingerprint, "submitting claim transaction");
        self.dispatcher.submit(action, params, &self.signer, on_status);
        Ok(())
    }

    fn set_status(&self, text: String) {
        *self.status.lock() = text;
    }
}

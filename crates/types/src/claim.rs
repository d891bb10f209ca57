use crate::account::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height on the target chain. Real blocks start at 1.
pub type BlockNumber = u64;

/// Reserved sentinel meaning "no claim exists" for a fingerprint.
pub const NO_CLAIM_BLOCK: BlockNumber = 0;

/// Chain-stored value for a fingerprint: the owning account and the block
/// at which the claim was registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub owner: AccountId,
    pub registered_at_block: BlockNumber,
}

impl ClaimRecord {
    pub fn new(owner: AccountId, registered_at_block: BlockNumber) -> Self {
        ClaimRecord {
            owner,
            registered_at_block,
        }
    }

    /// The sentinel record returned when no claim exists.
    pub fn none() -> Self {
        ClaimRecord::default()
    }

    /// Whether this record represents a live claim. The registration block
    /// is the single source of truth for claim status.
    pub fn exists(&self) -> bool {
        self.registered_at_block != NO_CLAIM_BLOCK
    }
}

/// The three claim transactions the panel can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClaimAction {
    CreateClaim,
    TransferClaim,
    RevokeClaim,
}

impl ClaimAction {
    /// Name of the remote call on the chain's transaction interface.
    pub fn call_name(&self) -> &'static str {
        match self {
            ClaimAction::CreateClaim => "createClaim",
            ClaimAction::TransferClaim => "transferClaim",
            ClaimAction::RevokeClaim => "revokeClaim",
        }
    }
}

impl fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_name())
    }
}

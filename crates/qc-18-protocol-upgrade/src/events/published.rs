//! Published events (Outgoing)

use crate::domain::EpochVersionDecision;
use serde::{Deserialize, Serialize};
use shared_types::{EpochId, ProtocolVersion, Stake};

/// Published once per epoch boundary, when its decision is first computed
///
/// Subscribers (block production, validation, networking) switch behavior
/// for the epoch after `boundary_epoch`. Replaying a cached decision does
/// not publish again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersionDecided {
    pub boundary_epoch: EpochId,
    pub decision_epoch: EpochId,
    pub previous_version: ProtocolVersion,
    /// Version effective for the next epoch
    pub version: ProtocolVersion,
    /// True if `version` differs from `previous_version`
    pub adopted: bool,
    pub winning_stake: Stake,
    pub total_stake: Stake,
}

impl From<&EpochVersionDecision> for ProtocolVersionDecided {
    fn from(decision: &EpochVersionDecision) -> Self {
        Self {
            boundary_epoch: decision.boundary_epoch,
            decision_epoch: decision.decision_epoch,
            previous_version: decision.previous_version,
            version: decision.version,
            adopted: decision.is_upgrade(),
            winning_stake: decision.winner.map(|(_, stake)| stake).unwrap_or(0),
            total_stake: decision.total_stake,
        }
    }
}

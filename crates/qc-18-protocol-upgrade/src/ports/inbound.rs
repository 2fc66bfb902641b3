//! Driving ports (Inbound API)

use crate::domain::{EpochVersionDecision, UpgradeResult};
use shared_types::{BlockHeight, EpochId, Hash, ProtocolVersion};

/// Primary Protocol Upgrade API
///
/// Consumed by block production and validation. Any error is fatal for the
/// caller: it must stop producing and validating rather than guess.
pub trait ProtocolUpgradeApi: Send + Sync {
    /// Protocol version effective for the epoch after the one containing
    /// `last_block`
    fn decide(&self, last_block: &Hash) -> UpgradeResult<ProtocolVersion>;

    /// Full decision record for the boundary at the end of `boundary_epoch`
    fn decision_for(&self, boundary_epoch: EpochId) -> UpgradeResult<EpochVersionDecision>;

    /// Decision already computed for `boundary_epoch`, without computing
    fn cached_decision(&self, boundary_epoch: EpochId) -> Option<EpochVersionDecision>;

    /// Version this node declares in a header at `height`
    fn declared_version_for(&self, height: BlockHeight) -> ProtocolVersion;

    /// Version the epoch following `epoch` runs under
    fn active_version_for_next_epoch(&self, epoch: EpochId) -> UpgradeResult<ProtocolVersion> {
        self.decision_for(epoch).map(|d| d.version)
    }
}

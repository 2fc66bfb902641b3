//! Driven ports (Outbound dependencies)
//!
//! All ports are synchronous: the decision engine runs over finalized,
//! already-materialized state and never waits on I/O.

use crate::domain::{EpochVersionDecision, UpgradeResult};
use crate::events::ProtocolVersionDecided;
use shared_types::{BlockHeader, BlockHeight, EpochId, Hash, ProtocolVersion, Stake, StakeTable, ValidatorId};

/// Epoch manager (external collaborator)
///
/// # Precondition
/// Only queried for epochs that are already finalized. Answers for a given
/// epoch must never change once returned.
pub trait EpochManager: Send + Sync {
    /// Epoch containing the given block
    fn epoch_of(&self, block: &Hash) -> UpgradeResult<EpochId>;

    /// Predecessor of `epoch`; `None` only for genesis
    fn prev_epoch(&self, epoch: EpochId) -> UpgradeResult<Option<EpochId>>;

    /// Validator assigned to produce `height` in `epoch`
    fn block_producer(&self, epoch: EpochId, height: BlockHeight) -> UpgradeResult<ValidatorId>;

    /// Stake table of `epoch`
    fn stake_table(&self, epoch: EpochId) -> UpgradeResult<StakeTable>;

    /// Total stake of `epoch`
    fn total_stake(&self, epoch: EpochId) -> UpgradeResult<Stake>;

    /// Protocol version that was active during `epoch`
    fn protocol_version(&self, epoch: EpochId) -> UpgradeResult<ProtocolVersion>;
}

/// Read access to finalized block headers
pub trait FinalizedChain: Send + Sync {
    /// Every finalized header of `epoch`, already upgraded to the canonical
    /// shape. Order is not significant; callers sort by height.
    fn headers_in_epoch(&self, epoch: EpochId) -> UpgradeResult<Vec<BlockHeader>>;
}

/// Persistence for computed decisions
pub trait DecisionStore: Send + Sync {
    /// Decision for the boundary at the end of `boundary_epoch`, if stored
    fn load(&self, boundary_epoch: EpochId) -> UpgradeResult<Option<EpochVersionDecision>>;

    /// Persist a decision. Storing the same boundary twice keeps the first.
    fn store(&self, decision: &EpochVersionDecision) -> UpgradeResult<()>;
}

/// Sink for published events
pub trait UpgradeEventSink: Send + Sync {
    /// Publish a decision. Delivery failures are reported, not retried.
    fn publish(&self, event: ProtocolVersionDecided) -> Result<(), String>;
}

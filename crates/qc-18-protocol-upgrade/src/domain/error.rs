//! Error types for the Protocol Upgrade subsystem
//!
//! Every error here is fatal to block production and validation on the node
//! that hits it: running on a guessed protocol version would fork the node
//! off the network.

use super::config::ConfigError;
use shared_types::{short_id, BlockHeight, EpochId, Hash, ValidatorId};
use shared_versioned::EnvelopeError;
use std::fmt;

/// Historical, consensus-critical state the epoch manager or the chain
/// store failed to supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoricalState {
    EpochOfBlock { block: Hash },
    PreviousEpoch { epoch: EpochId },
    BlockProducer { epoch: EpochId, height: BlockHeight },
    StakeTable { epoch: EpochId },
    ValidatorStake { epoch: EpochId, validator: ValidatorId },
    TotalStake { epoch: EpochId },
    ProtocolVersion { epoch: EpochId },
    EpochBlocks { epoch: EpochId },
}

impl HistoricalState {
    /// Short label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoricalState::EpochOfBlock { .. } => "epoch_of_block",
            HistoricalState::PreviousEpoch { .. } => "previous_epoch",
            HistoricalState::BlockProducer { .. } => "block_producer",
            HistoricalState::StakeTable { .. } => "stake_table",
            HistoricalState::ValidatorStake { .. } => "validator_stake",
            HistoricalState::TotalStake { .. } => "total_stake",
            HistoricalState::ProtocolVersion { .. } => "protocol_version",
            HistoricalState::EpochBlocks { .. } => "epoch_blocks",
        }
    }
}

impl fmt::Display for HistoricalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoricalState::EpochOfBlock { block } => {
                write!(f, "epoch of block {}", short_id(block))
            }
            HistoricalState::PreviousEpoch { epoch } => write!(f, "epoch preceding {epoch}"),
            HistoricalState::BlockProducer { epoch, height } => {
                write!(f, "block producer for height {height} in {epoch}")
            }
            HistoricalState::StakeTable { epoch } => write!(f, "stake table of {epoch}"),
            HistoricalState::ValidatorStake { epoch, validator } => {
                write!(f, "stake of validator {} in {epoch}", short_id(validator))
            }
            HistoricalState::TotalStake { epoch } => write!(f, "total stake of {epoch}"),
            HistoricalState::ProtocolVersion { epoch } => {
                write!(f, "protocol version active in {epoch}")
            }
            HistoricalState::EpochBlocks { epoch } => {
                write!(f, "finalized blocks of {epoch}")
            }
        }
    }
}

/// Protocol upgrade error types
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("Missing historical state: {state} ({reason})")]
    MissingHistoricalState {
        state: HistoricalState,
        reason: String,
    },

    #[error("Versioned envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("{epoch} is already registered")]
    EpochAlreadyRegistered { epoch: EpochId },

    #[error("Stake overflow while tallying {epoch}")]
    StakeOverflow { epoch: EpochId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Decision store error: {0}")]
    Store(String),
}

impl UpgradeError {
    pub fn missing(state: HistoricalState, reason: impl Into<String>) -> Self {
        UpgradeError::MissingHistoricalState {
            state,
            reason: reason.into(),
        }
    }
}

/// Result type for protocol upgrade operations
pub type UpgradeResult<T> = Result<T, UpgradeError>;

//! # Protocol Upgrade Configuration
//!
//! Policy constants for version adoption.
//!
//! These values are chain-level: every node must use the same ones, so they
//! come from the chain spec and change only through a coordinated protocol
//! upgrade. There is no per-node override.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, ProtocolVersion, Stake};
use thiserror::Error;

/// Number of epochs between the epoch whose declarations are counted and
/// the epoch boundary the decision is made at.
pub const PROTOCOL_UPGRADE_NUM_EPOCHS: u64 = 2;

/// Stake share a declared version needs to be adopted (80%).
pub const PROTOCOL_UPGRADE_BLOCK_THRESHOLD: StakeThreshold = StakeThreshold::new(80, 100);

/// Protocol version active in the genesis epoch.
pub const GENESIS_PROTOCOL_VERSION: ProtocolVersion = 1;

/// Highest protocol version this binary can run.
pub const PROTOCOL_VERSION: ProtocolVersion = 3;

/// Rational share of total stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeThreshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl StakeThreshold {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `stake / total >= numerator / denominator`, in exact integer math.
    ///
    /// Zero total stake never meets the threshold.
    pub fn is_met(&self, stake: Stake, total: Stake) -> bool {
        if total == 0 || self.denominator == 0 {
            return false;
        }
        U256::from(stake) * U256::from(self.denominator)
            >= U256::from(total) * U256::from(self.numerator)
    }

    /// Share of `stake` in `total` in basis points, rounded down.
    pub fn basis_points(stake: Stake, total: Stake) -> u64 {
        if total == 0 {
            return 0;
        }
        let bps = U256::from(stake) * U256::from(10_000u64) / U256::from(total);
        if bps > U256::from(u64::MAX) {
            u64::MAX
        } else {
            bps.low_u64()
        }
    }
}

impl Default for StakeThreshold {
    fn default() -> Self {
        PROTOCOL_UPGRADE_BLOCK_THRESHOLD
    }
}

/// Holds back a producer's vote for its newest version until a height.
///
/// Releases roll out before operators want to vote for the new version.
/// Until `vote_from_height` a binary keeps declaring `previous_version`.
/// Keyed on block height so every node's declaration is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeVoteSchedule {
    pub vote_from_height: BlockHeight,
    pub previous_version: ProtocolVersion,
}

/// Configuration for the protocol upgrade subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolUpgradeConfig {
    /// Version active in the genesis epoch.
    pub genesis_protocol_version: ProtocolVersion,
    /// Version this binary declares in the headers it produces.
    pub protocol_version: ProtocolVersion,
    /// Look-back window `W` in epochs (default: 2).
    pub num_epochs: u64,
    /// Adoption threshold (default: 80%).
    pub threshold: StakeThreshold,
    /// Optional delayed vote for `protocol_version`.
    pub vote_schedule: Option<UpgradeVoteSchedule>,
}

impl Default for ProtocolUpgradeConfig {
    fn default() -> Self {
        Self {
            genesis_protocol_version: GENESIS_PROTOCOL_VERSION,
            protocol_version: PROTOCOL_VERSION,
            num_epochs: PROTOCOL_UPGRADE_NUM_EPOCHS,
            threshold: PROTOCOL_UPGRADE_BLOCK_THRESHOLD,
            vote_schedule: None,
        }
    }
}

impl ProtocolUpgradeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genesis_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.genesis_protocol_version = version;
        self
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn with_num_epochs(mut self, num_epochs: u64) -> Self {
        self.num_epochs = num_epochs;
        self
    }

    pub fn with_threshold(mut self, threshold: StakeThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_vote_schedule(mut self, schedule: UpgradeVoteSchedule) -> Self {
        self.vote_schedule = Some(schedule);
        self
    }

    /// Load the `protocol_upgrade` section of a chain spec.
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_chain_spec_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable for consensus.
    ///
    /// The threshold must be a strict majority and at most 100%, otherwise
    /// two versions could both be adopted or none ever could.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.threshold;
        if t.denominator == 0 {
            return Err(ConfigError::ZeroDenominator);
        }
        if u128::from(t.numerator) * 2 <= u128::from(t.denominator) {
            return Err(ConfigError::ThresholdNotMajority {
                numerator: t.numerator,
                denominator: t.denominator,
            });
        }
        if t.numerator > t.denominator {
            return Err(ConfigError::ThresholdAboveTotal {
                numerator: t.numerator,
                denominator: t.denominator,
            });
        }
        if self.num_epochs == 0 {
            return Err(ConfigError::ZeroEpochWindow);
        }
        if self.protocol_version < self.genesis_protocol_version {
            return Err(ConfigError::BinaryBehindGenesis {
                binary: self.protocol_version,
                genesis: self.genesis_protocol_version,
            });
        }
        if let Some(schedule) = self.vote_schedule {
            if schedule.previous_version > self.protocol_version {
                return Err(ConfigError::ScheduleAheadOfBinary {
                    previous: schedule.previous_version,
                    binary: self.protocol_version,
                });
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid chain spec: {0}")]
    Parse(String),

    #[error("Threshold denominator is zero")]
    ZeroDenominator,

    #[error("Threshold {numerator}/{denominator} is not a strict majority")]
    ThresholdNotMajority { numerator: u64, denominator: u64 },

    #[error("Threshold {numerator}/{denominator} exceeds total stake")]
    ThresholdAboveTotal { numerator: u64, denominator: u64 },

    #[error("Look-back window must be at least one epoch")]
    ZeroEpochWindow,

    #[error("Binary protocol version {binary} is below genesis version {genesis}")]
    BinaryBehindGenesis {
        binary: ProtocolVersion,
        genesis: ProtocolVersion,
    },

    #[error("Vote schedule previous version {previous} is above binary version {binary}")]
    ScheduleAheadOfBinary {
        previous: ProtocolVersion,
        binary: ProtocolVersion,
    },
}

//! # Epoch Version Decision
//!
//! Turns a tally into the protocol version for the next epoch.
//!
//! ## Rules
//!
//! - The winning version is the one with the most stake, ties to the lower
//!   version.
//! - It is adopted only if its stake reaches the threshold share of the
//!   decision epoch's total stake. Otherwise the version already active
//!   stays: no supermajority means no change.
//! - The protocol version never decreases: a winner below the active
//!   version is not adopted.

use super::config::StakeThreshold;
use super::tally::VersionTally;
use serde::{Deserialize, Serialize};
use shared_types::{EpochId, ProtocolVersion, Stake};
use shared_versioned::codec;
use shared_versioned::{
    EnvelopeError, EnvelopeResult, ShapeDescriptor, VersionTag, Versioned, VersionedEnvelope,
};
use std::collections::BTreeMap;

/// Outcome of the decision engine for one epoch boundary.
///
/// Derived from finalized state only; cached and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochVersionDecision {
    /// Epoch containing the block the decision was requested for.
    pub boundary_epoch: EpochId,
    /// Epoch whose declarations and stakes were counted.
    pub decision_epoch: EpochId,
    /// Version active going into the boundary: the higher of the versions
    /// active in the decision epoch and in the boundary epoch.
    pub previous_version: ProtocolVersion,
    /// Version effective for the epoch after `boundary_epoch`.
    pub version: ProtocolVersion,
    /// Most-staked declared version and its stake, if anyone declared.
    pub winner: Option<(ProtocolVersion, Stake)>,
    pub total_stake: Stake,
    pub tally: BTreeMap<ProtocolVersion, Stake>,
    pub threshold_met: bool,
}

impl EpochVersionDecision {
    /// Apply the adoption rules to a tally.
    pub fn resolve(
        boundary_epoch: EpochId,
        decision_epoch: EpochId,
        previous_version: ProtocolVersion,
        tally: VersionTally,
        total_stake: Stake,
        threshold: StakeThreshold,
    ) -> Self {
        let winner = tally.winner();
        let threshold_met = winner
            .map(|(_, stake)| threshold.is_met(stake, total_stake))
            .unwrap_or(false);
        let version = match winner {
            Some((winning_version, _)) if threshold_met => winning_version.max(previous_version),
            _ => previous_version,
        };
        Self {
            boundary_epoch,
            decision_epoch,
            previous_version,
            version,
            winner,
            total_stake,
            tally: tally.into_map(),
            threshold_met,
        }
    }

    /// True if this decision moves the protocol forward.
    pub fn is_upgrade(&self) -> bool {
        self.version > self.previous_version
    }

    /// Winning share of total stake in basis points.
    pub fn winning_share_bps(&self) -> u64 {
        self.winner
            .map(|(_, stake)| StakeThreshold::basis_points(stake, self.total_stake))
            .unwrap_or(0)
    }
}

const TAG_V1: VersionTag = 0;
const TAG_V2: VersionTag = 1;

/// Envelope codec for persisted decisions.
pub type DecisionEnvelope = VersionedEnvelope<VersionedEpochDecision>;

/// First persisted layout: outcome only, no tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochVersionDecisionV1 {
    pub boundary_epoch: EpochId,
    pub decision_epoch: EpochId,
    pub previous_version: ProtocolVersion,
    pub version: ProtocolVersion,
}

impl From<EpochVersionDecisionV1> for EpochVersionDecision {
    fn from(v1: EpochVersionDecisionV1) -> Self {
        EpochVersionDecision {
            boundary_epoch: v1.boundary_epoch,
            decision_epoch: v1.decision_epoch,
            previous_version: v1.previous_version,
            version: v1.version,
            winner: None,
            total_stake: 0,
            tally: BTreeMap::new(),
            threshold_met: v1.version != v1.previous_version,
        }
    }
}

/// Persisted decision shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedEpochDecision {
    V1(EpochVersionDecisionV1),
    V2(EpochVersionDecision),
}

impl Versioned for VersionedEpochDecision {
    type Latest = EpochVersionDecision;

    const SHAPES: &'static [ShapeDescriptor] = &[
        ShapeDescriptor::active(TAG_V1, "EpochVersionDecisionV1"),
        ShapeDescriptor::active(TAG_V2, "EpochVersionDecision"),
    ];

    fn tag(&self) -> VersionTag {
        match self {
            VersionedEpochDecision::V1(_) => TAG_V1,
            VersionedEpochDecision::V2(_) => TAG_V2,
        }
    }

    fn decode_shape(tag: VersionTag, payload: &[u8]) -> EnvelopeResult<Self> {
        match tag {
            TAG_V1 => codec::decode_payload(tag, payload).map(VersionedEpochDecision::V1),
            TAG_V2 => codec::decode_payload(tag, payload).map(VersionedEpochDecision::V2),
            _ => Err(EnvelopeError::UnknownVersionTag {
                tag,
                latest: TAG_V2,
            }),
        }
    }

    fn encode_shape(&self) -> EnvelopeResult<Vec<u8>> {
        match self {
            VersionedEpochDecision::V1(d) => codec::encode_payload(TAG_V1, d),
            VersionedEpochDecision::V2(d) => codec::encode_payload(TAG_V2, d),
        }
    }

    fn upgrade_step(self) -> EnvelopeResult<Self> {
        match self {
            VersionedEpochDecision::V1(d) => Ok(VersionedEpochDecision::V2(d.into())),
            latest @ VersionedEpochDecision::V2(_) => Ok(latest),
        }
    }

    fn into_latest(self) -> Result<EpochVersionDecision, Self> {
        match self {
            VersionedEpochDecision::V2(d) => Ok(d),
            older => Err(older),
        }
    }

    fn from_latest(latest: EpochVersionDecision) -> Self {
        VersionedEpochDecision::V2(latest)
    }
}

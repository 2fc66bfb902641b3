//! # Core Domain Entities
//!
//! Primitive identifiers used by the protocol upgrade machinery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// Integer naming the consensus/wire "language" a binary speaks.
///
/// Monotonically non-decreasing along the chain. Distinct from a binary's
/// release version.
pub type ProtocolVersion = u32;

/// Validator identifier (32-byte public key hash).
pub type ValidatorId = [u8; 32];

/// Stake amount in base units.
pub type Stake = u128;

/// Block height in the chain.
pub type BlockHeight = u64;

/// Opaque, totally ordered epoch identifier assigned by the epoch manager.
///
/// Ordering follows the epoch manager's numbering. Which epoch is genesis
/// (has no predecessor) is decided by the epoch manager, not by this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EpochId(pub u64);

impl EpochId {
    /// Conventional identifier of the first epoch.
    pub const GENESIS: EpochId = EpochId(0);

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

impl From<u64> for EpochId {
    fn from(value: u64) -> Self {
        EpochId(value)
    }
}

/// Short hex prefix of an identifier for log lines.
pub fn short_id(id: &[u8; 32]) -> String {
    id[..4].iter().map(|b| format!("{b:02x}")).collect()
}

//! # Shared Types Crate
//!
//! Domain primitives and the block header as defined for protocol upgrades.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `ProtocolVersion`, `EpochId`, `ValidatorId`,
//!   `Stake` and the block header shapes are defined once, here.
//! - **Deterministic containers**: Anything iterated during consensus
//!   computations (stake tables) is ordered, never hashed.
//! - **Versioned on the wire**: Block headers are only persisted or gossiped
//!   inside a `VersionedEnvelope`; the rest of the system sees `BlockHeader`.

pub mod block_header;
pub mod entities;
pub mod stake;

pub use block_header::{
    BlockHeader, BlockHeaderEnvelope, BlockHeaderV1, BlockHeaderV2, VersionedBlockHeader,
    LEDGERLESS_DECLARED_VERSION,
};
pub use entities::*;
pub use stake::{StakeTable, StakeTableError};

//! # Block Header Shapes
//!
//! The block header is the canonical versionable structure. Every header
//! carries the protocol version its producer's binary can run
//! (`declared_version`), which the decision engine reads back once the
//! block is finalized.
//!
//! ## Shapes
//!
//! | Tag | Shape | Change |
//! |-----|-------|--------|
//! | 0 | `BlockHeaderV1` | original layout, no declared version |
//! | 1 | `BlockHeaderV2` | adds `declared_version` |
//! | 2 | `BlockHeader` | millisecond timestamps, `extra_data` |
//!
//! New shapes are appended; existing tags are never renumbered.

use crate::entities::{BlockHeight, Hash, ProtocolVersion, ValidatorId};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_versioned::codec;
use shared_versioned::{
    EnvelopeError, EnvelopeResult, ShapeDescriptor, VersionTag, Versioned, VersionedEnvelope,
};

/// Version recorded for headers produced before the ledger field existed.
pub const LEDGERLESS_DECLARED_VERSION: ProtocolVersion = 1;

const TAG_V1: VersionTag = 0;
const TAG_V2: VersionTag = 1;
const TAG_V3: VersionTag = 2;

/// Envelope codec for block headers.
pub type BlockHeaderEnvelope = VersionedEnvelope<VersionedBlockHeader>;

/// Original header layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderV1 {
    pub height: BlockHeight,
    pub prev_hash: Hash,
    pub author: ValidatorId,
    pub timestamp_secs: u64,
}

/// Header with the protocol version ledger field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderV2 {
    pub height: BlockHeight,
    pub prev_hash: Hash,
    pub author: ValidatorId,
    pub timestamp_secs: u64,
    pub declared_version: ProtocolVersion,
}

/// Canonical in-memory block header.
///
/// Immutable once finalized. Consensus fields owned by the finalization
/// subsystem travel in `extra_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: BlockHeight,
    pub prev_hash: Hash,
    /// Validator that produced the block.
    pub author: ValidatorId,
    /// Maximum protocol version the author's binary supported at production.
    pub declared_version: ProtocolVersion,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    pub extra_data: Vec<u8>,
}

impl BlockHeader {
    /// Keccak-256 of the canonical envelope bytes.
    ///
    /// Fed field by field in the envelope's byte layout, so it equals
    /// `Keccak256(to_envelope_bytes())` without allocating.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update([TAG_V3]);
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.author);
        hasher.update(self.declared_version.to_le_bytes());
        hasher.update(self.timestamp_ms.to_le_bytes());
        hasher.update((self.extra_data.len() as u64).to_le_bytes());
        hasher.update(&self.extra_data);
        hasher.finalize().into()
    }

    /// Envelope bytes for storage or gossip.
    pub fn to_envelope_bytes(&self) -> EnvelopeResult<Vec<u8>> {
        BlockHeaderEnvelope::encode(self)
    }

    /// Decode any historical shape and upgrade it.
    pub fn from_envelope_bytes(bytes: &[u8]) -> EnvelopeResult<Self> {
        BlockHeaderEnvelope::decode_latest(bytes)
    }
}

impl From<BlockHeaderV1> for BlockHeaderV2 {
    fn from(v1: BlockHeaderV1) -> Self {
        BlockHeaderV2 {
            height: v1.height,
            prev_hash: v1.prev_hash,
            author: v1.author,
            timestamp_secs: v1.timestamp_secs,
            declared_version: LEDGERLESS_DECLARED_VERSION,
        }
    }
}

/// Seconds become milliseconds; timestamps past `u64::MAX` ms clamp to
/// `u64::MAX`.
impl From<BlockHeaderV2> for BlockHeader {
    fn from(v2: BlockHeaderV2) -> Self {
        BlockHeader {
            height: v2.height,
            prev_hash: v2.prev_hash,
            author: v2.author,
            declared_version: v2.declared_version,
            timestamp_ms: v2.timestamp_secs.saturating_mul(1_000),
            extra_data: Vec::new(),
        }
    }
}

/// Every block header shape this binary can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedBlockHeader {
    V1(BlockHeaderV1),
    V2(BlockHeaderV2),
    V3(BlockHeader),
}

impl Versioned for VersionedBlockHeader {
    type Latest = BlockHeader;

    const SHAPES: &'static [ShapeDescriptor] = &[
        ShapeDescriptor::active(TAG_V1, "BlockHeaderV1"),
        ShapeDescriptor::active(TAG_V2, "BlockHeaderV2"),
        ShapeDescriptor::active(TAG_V3, "BlockHeader"),
    ];

    fn tag(&self) -> VersionTag {
        match self {
            VersionedBlockHeader::V1(_) => TAG_V1,
            VersionedBlockHeader::V2(_) => TAG_V2,
            VersionedBlockHeader::V3(_) => TAG_V3,
        }
    }

    fn decode_shape(tag: VersionTag, payload: &[u8]) -> EnvelopeResult<Self> {
        match tag {
            TAG_V1 => codec::decode_payload(tag, payload).map(VersionedBlockHeader::V1),
            TAG_V2 => codec::decode_payload(tag, payload).map(VersionedBlockHeader::V2),
            TAG_V3 => codec::decode_payload(tag, payload).map(VersionedBlockHeader::V3),
            _ => Err(EnvelopeError::UnknownVersionTag {
                tag,
                latest: TAG_V3,
            }),
        }
    }

    fn encode_shape(&self) -> EnvelopeResult<Vec<u8>> {
        match self {
            VersionedBlockHeader::V1(h) => codec::encode_payload(TAG_V1, h),
            VersionedBlockHeader::V2(h) => codec::encode_payload(TAG_V2, h),
            VersionedBlockHeader::V3(h) => codec::encode_payload(TAG_V3, h),
        }
    }

    fn upgrade_step(self) -> EnvelopeResult<Self> {
        match self {
            VersionedBlockHeader::V1(h) => Ok(VersionedBlockHeader::V2(h.into())),
            VersionedBlockHeader::V2(h) => Ok(VersionedBlockHeader::V3(h.into())),
            latest @ VersionedBlockHeader::V3(_) => Ok(latest),
        }
    }

    fn into_latest(self) -> Result<BlockHeader, Self> {
        match self {
            VersionedBlockHeader::V3(h) => Ok(h),
            older => Err(older),
        }
    }

    fn from_latest(latest: BlockHeader) -> Self {
        VersionedBlockHeader::V3(latest)
    }
}

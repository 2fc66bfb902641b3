//! # Envelope Errors
//!
//! Failure modes of decoding and upgrading versioned structures.
//!
//! Decode errors go back to the immediate caller: the network layer decides
//! whether to drop the peer, the storage layer refuses to load the record.

use thiserror::Error;

/// Discriminant byte that prefixes every encoded versioned structure.
pub type VersionTag = u8;

/// Errors produced by the versioned envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// No bytes at all, so not even a tag to read.
    #[error("Empty input: missing version tag")]
    EmptyInput,

    /// The tag is not in this binary's shape table (usually: upgrade the binary).
    #[error("Unknown version tag {tag}: highest known tag is {latest}")]
    UnknownVersionTag { tag: VersionTag, latest: VersionTag },

    /// The tag belongs to a shape whose upgrade path has been retired.
    #[error("Version tag {tag} ({name}) is retired and can no longer be decoded")]
    RetiredVersionTag { tag: VersionTag, name: &'static str },

    /// The tag is known but the payload does not parse as its shape.
    #[error("Malformed payload for version tag {tag}: {reason}")]
    MalformedPayload { tag: VersionTag, reason: String },

    /// An upgrade step met a value outside its domain. Upgrade steps are
    /// total over honestly produced data, so this is corruption or a bug.
    #[error("Irrecoverable upgrade from version tag {from}: {reason}")]
    IrrecoverableUpgrade { from: VersionTag, reason: String },

    /// A shape could not be encoded.
    #[error("Encoding failed for version tag {tag}: {reason}")]
    Encoding { tag: VersionTag, reason: String },
}

impl EnvelopeError {
    /// Returns true if a newer binary could decode this input.
    #[must_use]
    pub fn requires_newer_binary(&self) -> bool {
        matches!(self, EnvelopeError::UnknownVersionTag { .. })
    }

    /// Returns true if the input itself is corrupt.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            EnvelopeError::EmptyInput
                | EnvelopeError::MalformedPayload { .. }
                | EnvelopeError::IrrecoverableUpgrade { .. }
        )
    }
}

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

//! # Payload Codec
//!
//! Canonical byte encoding for shape payloads.
//!
//! The option set is pinned: fixed-width little-endian integers, a size
//! limit, and trailing bytes rejected. Two nodes encoding the same value get
//! the same bytes, and a payload followed by garbage is malformed rather
//! than silently accepted.

use crate::error::{EnvelopeError, EnvelopeResult, VersionTag};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Upper bound for a single shape payload (16 MiB).
pub const MAX_PAYLOAD_BYTES: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PAYLOAD_BYTES)
        .reject_trailing_bytes()
}

/// Encode a shape payload (without the tag byte).
pub fn encode_payload<S: Serialize>(tag: VersionTag, shape: &S) -> EnvelopeResult<Vec<u8>> {
    options()
        .serialize(shape)
        .map_err(|e| EnvelopeError::Encoding {
            tag,
            reason: e.to_string(),
        })
}

/// Decode a shape payload (without the tag byte).
///
/// The whole slice must be consumed.
pub fn decode_payload<S: DeserializeOwned>(tag: VersionTag, payload: &[u8]) -> EnvelopeResult<S> {
    options()
        .deserialize(payload)
        .map_err(|e| EnvelopeError::MalformedPayload {
            tag,
            reason: e.to_string(),
        })
}

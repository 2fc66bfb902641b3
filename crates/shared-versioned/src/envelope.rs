//! # Versioned Envelope
//!
//! `tag byte || canonical payload` for any type with several historical
//! shapes.
//!
//! A versionable entity is modelled as an enum with one variant per shape
//! and implements [`Versioned`]. [`VersionedEnvelope`] then provides the
//! generic operations:
//!
//! - `encode` always emits the latest tag.
//! - `decode` reads the tag, refuses tags this binary does not know, and
//!   parses the payload with the shape registered for the tag.
//! - `upgrade` folds the per-version steps `Vk -> Vk+1 -> ... -> Vn`.
//!
//! All operations are pure and hold no state, so they are safe to call from
//! any number of threads.

use crate::codec;
use crate::error::{EnvelopeError, EnvelopeResult, VersionTag};
use crate::registry::{self, ShapeDescriptor};
use serde::Serialize;
use std::marker::PhantomData;

/// A data structure with a finite, append-only set of historical shapes.
///
/// Implementors are enums whose variants wrap one shape each. The latest
/// shape is the canonical in-memory representation.
pub trait Versioned: Sized {
    /// The canonical (latest) in-memory shape.
    type Latest: Serialize;

    /// Every tag ever assigned to this entity, ascending.
    const SHAPES: &'static [ShapeDescriptor];

    /// Tag of the shape held by this value.
    fn tag(&self) -> VersionTag;

    /// Parse the payload registered for `tag`. Only called with active tags.
    fn decode_shape(tag: VersionTag, payload: &[u8]) -> EnvelopeResult<Self>;

    /// Encode this shape's payload, without the tag byte.
    fn encode_shape(&self) -> EnvelopeResult<Vec<u8>>;

    /// Convert this shape into the next one in the chain.
    ///
    /// Must be total over every value `decode_shape` can produce; a value
    /// outside the step's domain is reported as `IrrecoverableUpgrade`.
    fn upgrade_step(self) -> EnvelopeResult<Self>;

    /// Unwrap the latest shape, or hand back an older one.
    fn into_latest(self) -> Result<Self::Latest, Self>;

    /// Wrap a value of the latest shape.
    fn from_latest(latest: Self::Latest) -> Self;
}

/// Generic encode/decode/upgrade over a [`Versioned`] entity.
pub struct VersionedEnvelope<T>(PhantomData<T>);

impl<T: Versioned> VersionedEnvelope<T> {
    /// Tag used when producing new data.
    pub fn latest_tag() -> VersionTag {
        registry::latest_tag(T::SHAPES).unwrap_or_default()
    }

    /// Encode a value of the latest shape under the latest tag.
    pub fn encode(value: &T::Latest) -> EnvelopeResult<Vec<u8>> {
        let tag = Self::latest_tag();
        let payload = codec::encode_payload(tag, value)?;
        Ok(Self::frame(tag, payload))
    }

    /// Encode a specific (possibly historical) shape under its own tag.
    ///
    /// Retired shapes cannot be emitted.
    pub fn encode_shape(shape: &T) -> EnvelopeResult<Vec<u8>> {
        let tag = shape.tag();
        registry::resolve(T::SHAPES, tag)?;
        let payload = shape.encode_shape()?;
        Ok(Self::frame(tag, payload))
    }

    /// Read the tag and decode the shape registered for it.
    pub fn decode(bytes: &[u8]) -> EnvelopeResult<T> {
        let (&tag, payload) = bytes.split_first().ok_or(EnvelopeError::EmptyInput)?;
        registry::resolve(T::SHAPES, tag)?;
        let shape = T::decode_shape(tag, payload)?;
        if shape.tag() != tag {
            return Err(EnvelopeError::MalformedPayload {
                tag,
                reason: format!("decoded shape reports tag {}", shape.tag()),
            });
        }
        Ok(shape)
    }

    /// Upgrade any decoded shape to the latest one.
    pub fn upgrade(shape: T) -> EnvelopeResult<T::Latest> {
        let mut current = shape;
        loop {
            match current.into_latest() {
                Ok(latest) => return Ok(latest),
                Err(older) => {
                    let from = older.tag();
                    let next = older.upgrade_step()?;
                    if next.tag() <= from {
                        return Err(EnvelopeError::IrrecoverableUpgrade {
                            from,
                            reason: format!("upgrade step produced tag {}", next.tag()),
                        });
                    }
                    tracing::trace!(from, to = next.tag(), "versioned shape upgraded");
                    current = next;
                }
            }
        }
    }

    /// Decode and upgrade in one go.
    pub fn decode_latest(bytes: &[u8]) -> EnvelopeResult<T::Latest> {
        Self::upgrade(Self::decode(bytes)?)
    }

    fn frame(tag: VersionTag, payload: Vec<u8>) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + 1);
        out.push(tag);
        out.extend_from_slice(&payload);
        out
    }
}

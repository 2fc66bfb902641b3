//! # Shape Registry
//!
//! Static tag tables for versionable types.
//!
//! Each versionable type lists every tag it has ever used, in ascending
//! order, together with whether the shape behind the tag is still decodable.
//! The table is the single place where tag space is accounted for: there are
//! 256 tags, and once they run out old shapes have to be retired before a new
//! one can be appended.

use crate::error::{EnvelopeError, EnvelopeResult, VersionTag};
use thiserror::Error;

/// Whether a registered shape can still be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeStatus {
    /// Decodable and upgradable to the latest shape.
    Active,
    /// Upgrade path removed by an explicit migration. Records with this tag
    /// are no longer expected in reachable state.
    Retired,
}

/// One entry of a shape table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDescriptor {
    pub tag: VersionTag,
    pub name: &'static str,
    pub status: ShapeStatus,
}

impl ShapeDescriptor {
    /// A decodable shape.
    pub const fn active(tag: VersionTag, name: &'static str) -> Self {
        Self {
            tag,
            name,
            status: ShapeStatus::Active,
        }
    }

    /// A shape whose upgrade path has been retired.
    pub const fn retired(tag: VersionTag, name: &'static str) -> Self {
        Self {
            tag,
            name,
            status: ShapeStatus::Retired,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ShapeStatus::Active
    }
}

/// Structural problems in a shape table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Shape table is empty")]
    Empty,

    #[error("Shape table is not strictly ascending: tag {tag} follows {previous}")]
    NotAscending { previous: VersionTag, tag: VersionTag },

    #[error("Latest shape (tag {tag}) cannot be retired")]
    LatestRetired { tag: VersionTag },
}

/// Check the invariants of a shape table.
///
/// - at least one shape
/// - tags strictly ascending (append-only, no reuse within the table)
/// - the last shape is active, since it is the one being produced
pub fn validate(shapes: &[ShapeDescriptor]) -> Result<(), RegistryError> {
    let last = shapes.last().ok_or(RegistryError::Empty)?;
    for pair in shapes.windows(2) {
        if pair[1].tag <= pair[0].tag {
            return Err(RegistryError::NotAscending {
                previous: pair[0].tag,
                tag: pair[1].tag,
            });
        }
    }
    if !last.is_active() {
        return Err(RegistryError::LatestRetired { tag: last.tag });
    }
    Ok(())
}

/// Tag of the latest (currently produced) shape.
pub fn latest_tag(shapes: &[ShapeDescriptor]) -> Option<VersionTag> {
    shapes.last().map(|s| s.tag)
}

/// Number of tags still free after the latest shape.
pub fn remaining_tags(shapes: &[ShapeDescriptor]) -> usize {
    match latest_tag(shapes) {
        Some(tag) => usize::from(VersionTag::MAX - tag),
        None => usize::from(VersionTag::MAX) + 1,
    }
}

/// Tags that still decode, oldest first.
pub fn active_tags(shapes: &[ShapeDescriptor]) -> impl Iterator<Item = VersionTag> + '_ {
    shapes.iter().filter(|s| s.is_active()).map(|s| s.tag)
}

/// Resolve a tag read from the wire against a shape table.
pub fn resolve(shapes: &[ShapeDescriptor], tag: VersionTag) -> EnvelopeResult<&ShapeDescriptor> {
    let latest = latest_tag(shapes).unwrap_or_default();
    match shapes.binary_search_by_key(&tag, |s| s.tag) {
        Ok(idx) => {
            let shape = &shapes[idx];
            if shape.is_active() {
                Ok(shape)
            } else {
                Err(EnvelopeError::RetiredVersionTag {
                    tag,
                    name: shape.name,
                })
            }
        }
        Err(_) => Err(EnvelopeError::UnknownVersionTag { tag, latest }),
    }
}

//! # Shared Versioned Crate
//!
//! Generic machinery for data structures that have several historical
//! shapes. A value on disk or on the wire is a single tag byte followed by
//! the canonical payload of the shape registered for that tag.
//!
//! ## Design Principles
//!
//! - **Append-only tags**: New shapes get a new tag at the end of the table.
//!   A tag is never reordered and never reused while its old shape can still
//!   be found in reachable state.
//! - **Refuse the future**: A tag newer than this binary knows is an error,
//!   never a guess.
//! - **One in-memory shape**: Everything above the storage and network layers
//!   sees only the latest shape; older shapes are upgraded on read.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shared_versioned::VersionedEnvelope;
//!
//! let bytes = VersionedEnvelope::<VersionedBlockHeader>::encode(&header)?;
//! let header = VersionedEnvelope::<VersionedBlockHeader>::decode_latest(&bytes)?;
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod registry;

pub use envelope::{Versioned, VersionedEnvelope};
pub use error::{EnvelopeError, EnvelopeResult, VersionTag};
pub use registry::{ShapeDescriptor, ShapeStatus};

//! # Client Version Policy
//!
//! Binds observable changes in a client release to release-version bumps.
//! This does not gate consensus (protocol activation is decided by stake);
//! it decides when two binaries may claim to interoperate.
//!
//! | Change | Bump |
//! |--------|------|
//! | RPC response shape, wire message shape (even when enveloped), error text, on-disk layout needing migration, behavior change gated on a future height | MAJOR |
//! | Purely additive, backward-compatible surface | MINOR |
//! | Anything else | PATCH |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Release version of a client binary (not the protocol version).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Required increment for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

/// Categories of change a release can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    RpcResponse,
    WireMessageShape,
    ErrorText,
    DiskLayoutMigration,
    HeightGatedBehavior,
    AdditiveSurface,
    Internal,
}

impl ChangeKind {
    pub fn required_bump(&self) -> VersionBump {
        match self {
            ChangeKind::RpcResponse
            | ChangeKind::WireMessageShape
            | ChangeKind::ErrorText
            | ChangeKind::DiskLayoutMigration
            | ChangeKind::HeightGatedBehavior => VersionBump::Major,
            ChangeKind::AdditiveSurface => VersionBump::Minor,
            ChangeKind::Internal => VersionBump::Patch,
        }
    }
}

/// The changes going into one release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<ChangeKind>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, change: ChangeKind) -> Self {
        self.changes.push(change);
        self
    }

    pub fn push(&mut self, change: ChangeKind) {
        self.changes.push(change);
    }

    /// Largest bump any change requires. An empty release is a patch.
    pub fn required_bump(&self) -> VersionBump {
        self.changes
            .iter()
            .map(ChangeKind::required_bump)
            .max()
            .unwrap_or(VersionBump::Patch)
    }
}

impl FromIterator<ChangeKind> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ChangeKind>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid client version {0:?}: expected MAJOR.MINOR.PATCH")]
    InvalidFormat(String),

    #[error("Release {next} does not follow {previous} with a {required:?} bump")]
    PolicyViolation {
        previous: ClientVersion,
        next: ClientVersion,
        required: VersionBump,
    },
}

impl ClientVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Apply a bump, resetting lower components.
    ///
    /// `None` if the bumped component is already at `u32::MAX`: such a
    /// version has no successor of that kind.
    pub fn bumped(&self, bump: VersionBump) -> Option<Self> {
        match bump {
            VersionBump::Major => Some(Self::new(self.major.checked_add(1)?, 0, 0)),
            VersionBump::Minor => Some(Self::new(self.major, self.minor.checked_add(1)?, 0)),
            VersionBump::Patch => {
                Some(Self::new(self.major, self.minor, self.patch.checked_add(1)?))
            }
        }
    }

    /// Two binaries may claim interoperability only within one major line.
    pub fn interoperable_with(&self, other: &ClientVersion) -> bool {
        self.major == other.major
    }

    /// Bump carried by `next` relative to `self`, if `next` is a valid
    /// successor at all.
    fn bump_to(&self, next: &ClientVersion) -> Option<VersionBump> {
        [VersionBump::Major, VersionBump::Minor, VersionBump::Patch]
            .into_iter()
            .find(|bump| self.bumped(*bump).as_ref() == Some(next))
    }
}

/// Check that a release version honours the policy for its changes.
///
/// A release may bump more than required (a major release may contain only
/// patches), never less.
pub fn check_release(
    previous: &ClientVersion,
    next: &ClientVersion,
    changes: &ChangeSet,
) -> Result<(), PolicyError> {
    let required = changes.required_bump();
    match previous.bump_to(next) {
        Some(actual) if actual >= required => Ok(()),
        _ => Err(PolicyError::PolicyViolation {
            previous: *previous,
            next: *next,
            required,
        }),
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ClientVersion {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PolicyError::InvalidFormat(s.to_string());
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, PolicyError> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };
        let version = ClientVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

//! Stake-weighted tally of declared protocol versions.
//!
//! Two pure steps over immutable snapshots:
//!
//! 1. Fold the decision epoch's blocks in height order, keeping only each
//!    author's first declaration.
//! 2. Sum each author's stake into the version it declared.
//!
//! Everything is keyed by ordered maps so independent nodes iterate in the
//! same order and reach byte-identical results.

use super::error::{HistoricalState, UpgradeError, UpgradeResult};
use shared_types::{BlockHeight, ProtocolVersion, Stake, StakeTable, ValidatorId};
use std::collections::BTreeMap;

/// One block's contribution to the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub height: BlockHeight,
    /// Producer assigned to `height` by the epoch manager.
    pub author: ValidatorId,
    pub version: ProtocolVersion,
}

/// First declared version per author.
///
/// Later blocks by the same author in the same epoch do not change the
/// recorded declaration, so producing many blocks buys no extra influence.
pub fn first_declarations<I>(declarations: I) -> BTreeMap<ValidatorId, ProtocolVersion>
where
    I: IntoIterator<Item = Declaration>,
{
    let mut ordered: Vec<Declaration> = declarations.into_iter().collect();
    ordered.sort_by_key(|d| d.height);
    ordered.into_iter().fold(BTreeMap::new(), |mut acc, d| {
        acc.entry(d.author).or_insert(d.version);
        acc
    })
}

/// Aggregated stake per declared version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTally {
    per_version: BTreeMap<ProtocolVersion, Stake>,
}

impl VersionTally {
    /// Sum each author's stake into its declared version.
    ///
    /// An author missing from the stake table is missing consensus state,
    /// not a zero-stake voter.
    pub fn aggregate(
        declarations: &BTreeMap<ValidatorId, ProtocolVersion>,
        stakes: &StakeTable,
    ) -> UpgradeResult<Self> {
        let epoch = stakes.epoch();
        let mut per_version: BTreeMap<ProtocolVersion, Stake> = BTreeMap::new();
        for (author, version) in declarations {
            let stake = stakes.get(author).ok_or_else(|| {
                UpgradeError::missing(
                    HistoricalState::ValidatorStake {
                        epoch,
                        validator: *author,
                    },
                    "block producer absent from stake table",
                )
            })?;
            let entry = per_version.entry(*version).or_insert(0);
            *entry = entry
                .checked_add(stake)
                .ok_or(UpgradeError::StakeOverflow { epoch })?;
        }
        Ok(Self { per_version })
    }

    pub fn from_stakes<I>(stakes: I) -> Self
    where
        I: IntoIterator<Item = (ProtocolVersion, Stake)>,
    {
        Self {
            per_version: stakes.into_iter().collect(),
        }
    }

    pub fn stake_for(&self, version: ProtocolVersion) -> Stake {
        self.per_version.get(&version).copied().unwrap_or(0)
    }

    /// Version with the most stake; ties go to the lower version.
    pub fn winner(&self) -> Option<(ProtocolVersion, Stake)> {
        // Ascending iteration + strict comparison keeps the lower version on ties.
        self.per_version
            .iter()
            .fold(None, |best: Option<(ProtocolVersion, Stake)>, (&v, &s)| match best {
                Some((_, best_stake)) if s <= best_stake => best,
                _ => Some((v, s)),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.per_version.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProtocolVersion, &Stake)> {
        self.per_version.iter()
    }

    pub fn into_map(self) -> BTreeMap<ProtocolVersion, Stake> {
        self.per_version
    }
}

//! Per-epoch stake table.
//!
//! Supplied by the epoch manager and immutable for its epoch. Backed by a
//! `BTreeMap` so every node iterates validators in the same order.

use crate::entities::{EpochId, Stake, ValidatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeTableError {
    #[error("Total stake overflows u128 in {epoch}")]
    Overflow { epoch: EpochId },
}

/// Validator stakes for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StakeTable {
    epoch: EpochId,
    stakes: BTreeMap<ValidatorId, Stake>,
}

impl StakeTable {
    pub fn new(epoch: EpochId) -> Self {
        Self {
            epoch,
            stakes: BTreeMap::new(),
        }
    }

    /// Build from `(validator, stake)` pairs. A repeated validator keeps the
    /// last stake given.
    pub fn from_stakes<I>(epoch: EpochId, stakes: I) -> Self
    where
        I: IntoIterator<Item = (ValidatorId, Stake)>,
    {
        Self {
            epoch,
            stakes: stakes.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, validator: ValidatorId, stake: Stake) {
        self.stakes.insert(validator, stake);
    }

    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    pub fn get(&self, validator: &ValidatorId) -> Option<Stake> {
        self.stakes.get(validator).copied()
    }

    pub fn contains(&self, validator: &ValidatorId) -> bool {
        self.stakes.contains_key(validator)
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    /// Validators in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ValidatorId, &Stake)> {
        self.stakes.iter()
    }

    /// Sum of all stakes.
    pub fn total(&self) -> Result<Stake, StakeTableError> {
        self.stakes
            .values()
            .try_fold(0u128, |acc, s| acc.checked_add(*s))
            .ok_or(StakeTableError::Overflow { epoch: self.epoch })
    }
}

//! In-memory decision store
//!
//! Decisions are kept as envelope bytes, the same way a persistent store
//! would write them, so reads exercise the full decode-and-upgrade path.

use crate::domain::{DecisionEnvelope, EpochVersionDecision, UpgradeResult};
use crate::ports::DecisionStore;
use parking_lot::RwLock;
use shared_types::EpochId;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    records: RwLock<BTreeMap<EpochId, Vec<u8>>>,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw envelope bytes, e.g. written by an older binary.
    pub fn insert_raw(&self, boundary_epoch: EpochId, bytes: Vec<u8>) {
        self.records.write().insert(boundary_epoch, bytes);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn load(&self, boundary_epoch: EpochId) -> UpgradeResult<Option<EpochVersionDecision>> {
        match self.records.read().get(&boundary_epoch) {
            Some(bytes) => Ok(Some(DecisionEnvelope::decode_latest(bytes)?)),
            None => Ok(None),
        }
    }

    fn store(&self, decision: &EpochVersionDecision) -> UpgradeResult<()> {
        let bytes = DecisionEnvelope::encode(decision)?;
        self.records
            .write()
            .entry(decision.boundary_epoch)
            .or_insert(bytes);
        Ok(())
    }
}

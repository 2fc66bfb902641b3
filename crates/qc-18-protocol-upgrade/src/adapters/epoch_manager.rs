//! In-memory epoch manager
//!
//! Holds finalized epoch data handed to it by whoever drives the chain: the
//! epoch graph, per-epoch stake tables, producer assignments, block-to-epoch
//! mapping and the protocol version each epoch ran under.

use crate::domain::{HistoricalState, UpgradeError, UpgradeResult};
use crate::ports::EpochManager;
use parking_lot::RwLock;
use shared_types::{
    BlockHeight, EpochId, Hash, ProtocolVersion, Stake, StakeTable, ValidatorId,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct EpochRecord {
    prev: Option<EpochId>,
    stakes: StakeTable,
    producers: BTreeMap<BlockHeight, ValidatorId>,
    protocol_version: Option<ProtocolVersion>,
}

#[derive(Debug, Default)]
struct EpochBook {
    epochs: BTreeMap<EpochId, EpochRecord>,
    blocks: BTreeMap<Hash, EpochId>,
}

/// Epoch manager backed by ordered maps behind a lock
///
/// Finalized epochs are append-only: an epoch is registered once, and its
/// predecessor and stake table never change afterwards.
#[derive(Debug, Default)]
pub struct InMemoryEpochManager {
    book: RwLock<EpochBook>,
}

impl InMemoryEpochManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a finalized epoch and its stake table.
    ///
    /// `prev` is `None` for genesis.
    pub fn add_epoch(
        &self,
        epoch: EpochId,
        prev: Option<EpochId>,
        stakes: StakeTable,
    ) -> UpgradeResult<()> {
        let mut book = self.book.write();
        if book.epochs.contains_key(&epoch) {
            warn!("[qc-18] Refusing to re-register {}", epoch);
            return Err(UpgradeError::EpochAlreadyRegistered { epoch });
        }
        book.epochs.insert(
            epoch,
            EpochRecord {
                prev,
                stakes,
                producers: BTreeMap::new(),
                protocol_version: None,
            },
        );
        debug!("[qc-18] Registered {} (prev: {:?})", epoch, prev);
        Ok(())
    }

    /// Record the producer assigned to `height` in `epoch`.
    pub fn assign_producer(
        &self,
        epoch: EpochId,
        height: BlockHeight,
        producer: ValidatorId,
    ) -> UpgradeResult<()> {
        let state = HistoricalState::BlockProducer { epoch, height };
        self.with_epoch_mut(epoch, state, |record| {
            record.producers.insert(height, producer);
        })
    }

    /// Record that `block` belongs to `epoch`.
    pub fn record_block(&self, block: Hash, epoch: EpochId) {
        self.book.write().blocks.insert(block, epoch);
    }

    /// Record the protocol version `epoch` ran under.
    pub fn set_protocol_version(
        &self,
        epoch: EpochId,
        version: ProtocolVersion,
    ) -> UpgradeResult<()> {
        let state = HistoricalState::ProtocolVersion { epoch };
        self.with_epoch_mut(epoch, state, |record| {
            record.protocol_version = Some(version);
        })
    }

    pub fn epoch_count(&self) -> usize {
        self.book.read().epochs.len()
    }

    fn with_epoch_mut(
        &self,
        epoch: EpochId,
        state: HistoricalState,
        f: impl FnOnce(&mut EpochRecord),
    ) -> UpgradeResult<()> {
        let mut book = self.book.write();
        match book.epochs.get_mut(&epoch) {
            Some(record) => {
                f(record);
                Ok(())
            }
            None => {
                warn!("[qc-18] Dropping write of {}: epoch not registered", state);
                Err(UpgradeError::missing(state, "epoch not registered"))
            }
        }
    }

    fn with_epoch<R>(
        &self,
        epoch: EpochId,
        state: HistoricalState,
        f: impl FnOnce(&EpochRecord) -> Option<R>,
    ) -> UpgradeResult<R> {
        let book = self.book.read();
        let record = book
            .epochs
            .get(&epoch)
            .ok_or_else(|| UpgradeError::missing(state.clone(), "epoch not registered"))?;
        f(record).ok_or_else(|| UpgradeError::missing(state, "not recorded for epoch"))
    }
}

impl EpochManager for InMemoryEpochManager {
    fn epoch_of(&self, block: &Hash) -> UpgradeResult<EpochId> {
        self.book.read().blocks.get(block).copied().ok_or_else(|| {
            UpgradeError::missing(
                HistoricalState::EpochOfBlock { block: *block },
                "block not recorded",
            )
        })
    }

    fn prev_epoch(&self, epoch: EpochId) -> UpgradeResult<Option<EpochId>> {
        self.with_epoch(epoch, HistoricalState::PreviousEpoch { epoch }, |r| {
            Some(r.prev)
        })
    }

    fn block_producer(&self, epoch: EpochId, height: BlockHeight) -> UpgradeResult<ValidatorId> {
        self.with_epoch(epoch, HistoricalState::BlockProducer { epoch, height }, |r| {
            r.producers.get(&height).copied()
        })
    }

    fn stake_table(&self, epoch: EpochId) -> UpgradeResult<StakeTable> {
        self.with_epoch(epoch, HistoricalState::StakeTable { epoch }, |r| {
            Some(r.stakes.clone())
        })
    }

    fn total_stake(&self, epoch: EpochId) -> UpgradeResult<Stake> {
        let stakes = self.stake_table(epoch)?;
        stakes
            .total()
            .map_err(|_| UpgradeError::StakeOverflow { epoch })
    }

    fn protocol_version(&self, epoch: EpochId) -> UpgradeResult<ProtocolVersion> {
        self.with_epoch(epoch, HistoricalState::ProtocolVersion { epoch }, |r| {
            r.protocol_version
        })
    }
}

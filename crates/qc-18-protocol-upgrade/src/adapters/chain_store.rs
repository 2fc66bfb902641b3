//! Finalized chain store holding envelope bytes
//!
//! Headers are kept exactly as they arrived from disk or the wire, in
//! whatever historical shape they were produced. Reads decode and upgrade
//! every record, so the decision engine only ever sees `BlockHeader`.

use crate::domain::{HistoricalState, UpgradeError, UpgradeResult};
use crate::ports::FinalizedChain;
use parking_lot::RwLock;
use shared_types::{BlockHeader, BlockHeight, EpochId};
use std::collections::BTreeMap;
use tracing::{error, trace};

/// Chain store keyed by epoch, then height
#[derive(Debug, Default)]
pub struct EnvelopeChainStore {
    epochs: RwLock<BTreeMap<EpochId, BTreeMap<BlockHeight, Vec<u8>>>>,
}

impl EnvelopeChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an epoch that finalized without blocks.
    pub fn open_epoch(&self, epoch: EpochId) {
        self.epochs.write().entry(epoch).or_default();
    }

    /// Store a header in the latest shape.
    pub fn append(&self, epoch: EpochId, header: &BlockHeader) -> UpgradeResult<()> {
        let bytes = header.to_envelope_bytes()?;
        self.append_raw(epoch, header.height, bytes);
        Ok(())
    }

    /// Store envelope bytes as received, in any shape.
    ///
    /// Bytes are not checked here; a corrupt record fails the read instead.
    pub fn append_raw(&self, epoch: EpochId, height: BlockHeight, bytes: Vec<u8>) {
        trace!("[qc-18] Stored {} envelope bytes at height {}", bytes.len(), height);
        self.epochs
            .write()
            .entry(epoch)
            .or_default()
            .insert(height, bytes);
    }

    /// Raw envelope bytes at `height`, if stored.
    pub fn raw(&self, epoch: EpochId, height: BlockHeight) -> Option<Vec<u8>> {
        self.epochs.read().get(&epoch)?.get(&height).cloned()
    }

    pub fn block_count(&self, epoch: EpochId) -> usize {
        self.epochs.read().get(&epoch).map_or(0, BTreeMap::len)
    }
}

impl FinalizedChain for EnvelopeChainStore {
    fn headers_in_epoch(&self, epoch: EpochId) -> UpgradeResult<Vec<BlockHeader>> {
        let epochs = self.epochs.read();
        let records = epochs.get(&epoch).ok_or_else(|| {
            UpgradeError::missing(HistoricalState::EpochBlocks { epoch }, "epoch not stored")
        })?;

        records
            .iter()
            .map(|(height, bytes)| {
                BlockHeader::from_envelope_bytes(bytes).map_err(|e| {
                    error!(
                        "[qc-18] Corrupt header at height {} in {}: {}",
                        height, epoch, e
                    );
                    UpgradeError::from(e)
                })
            })
            .collect()
    }
}

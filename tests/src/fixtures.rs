//! # Simulated Finalized Chain
//!
//! Builds a linear chain epoch by epoch into the in-memory epoch manager and
//! envelope chain store. Construction is fully deterministic: two chains
//! built with the same validators and declarations have identical hashes,
//! which is what independent nodes observe.

use parking_lot::RwLock;
use qc_18_protocol_upgrade::{
    EnvelopeChainStore, InMemoryDecisionStore, InMemoryEpochManager, InMemoryEventBus,
    ProtocolUpgradeConfig, ProtocolUpgradeDependencies, ProtocolUpgradeService, UpgradeResult,
};
use shared_types::{
    BlockHeader, BlockHeight, EpochId, Hash, ProtocolVersion, Stake, StakeTable, ValidatorId,
};
use std::sync::Arc;

/// Service wired to a simulated chain.
pub type SimulatedService = ProtocolUpgradeService<
    InMemoryEpochManager,
    EnvelopeChainStore,
    InMemoryDecisionStore,
    InMemoryEventBus,
>;

/// Deterministic validator id for index `i`.
pub fn validator_id(i: usize) -> ValidatorId {
    let mut id = [0u8; 32];
    id[..8].copy_from_slice(&(i as u64).to_be_bytes());
    id[31] = 0x5A;
    id
}

#[derive(Debug, Clone, Copy)]
struct Tip {
    hash: Hash,
    height: BlockHeight,
    epoch: Option<EpochId>,
}

pub struct SimulatedChain {
    pub epoch_manager: Arc<InMemoryEpochManager>,
    pub chain: Arc<EnvelopeChainStore>,
    validators: Vec<(ValidatorId, Stake)>,
    blocks_per_epoch: u64,
    tip: RwLock<Tip>,
}

impl SimulatedChain {
    /// Validators with the given stakes, in index order.
    ///
    /// Needs at least one validator and one block per epoch.
    pub fn new(stakes: &[Stake], blocks_per_epoch: u64) -> Self {
        Self {
            epoch_manager: Arc::new(InMemoryEpochManager::new()),
            chain: Arc::new(EnvelopeChainStore::new()),
            validators: stakes
                .iter()
                .enumerate()
                .map(|(i, stake)| (validator_id(i), *stake))
                .collect(),
            blocks_per_epoch,
            tip: RwLock::new(Tip {
                hash: [0u8; 32],
                height: 0,
                epoch: None,
            }),
        }
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Finalize the next epoch, which runs under `active_version`.
    ///
    /// Producers rotate round-robin by validator index. `declare` returns
    /// the version validator `i` declares at a height. Returns the hash of
    /// the epoch's last block.
    pub fn finalize_epoch<F>(&self, active_version: ProtocolVersion, declare: F) -> UpgradeResult<Hash>
    where
        F: Fn(usize, BlockHeight) -> ProtocolVersion,
    {
        let mut tip = self.tip.write();
        let epoch = tip.epoch.map_or(EpochId::GENESIS, |e| EpochId(e.0 + 1));

        let stakes = StakeTable::from_stakes(epoch, self.validators.iter().copied());
        self.epoch_manager.add_epoch(epoch, tip.epoch, stakes)?;
        self.epoch_manager.set_protocol_version(epoch, active_version)?;
        self.chain.open_epoch(epoch);

        for _ in 0..self.blocks_per_epoch {
            let height = tip.height + 1;
            let index = (height as usize) % self.validators.len();
            let (author, _) = self.validators[index];
            let header = BlockHeader {
                height,
                prev_hash: tip.hash,
                author,
                declared_version: declare(index, height),
                timestamp_ms: height * 1_000,
                extra_data: vec![],
            };
            self.chain.append(epoch, &header)?;
            self.epoch_manager.assign_producer(epoch, height, author)?;
            let hash = header.hash();
            self.epoch_manager.record_block(hash, epoch);
            tip.hash = hash;
            tip.height = height;
        }
        tip.epoch = Some(epoch);
        Ok(tip.hash)
    }

    /// A node's service over this chain, with its own store and event bus.
    pub fn service(&self, config: ProtocolUpgradeConfig) -> UpgradeResult<SimulatedService> {
        ProtocolUpgradeService::new(ProtocolUpgradeDependencies {
            epoch_manager: Arc::clone(&self.epoch_manager),
            chain: Arc::clone(&self.chain),
            decision_store: Arc::new(InMemoryDecisionStore::new()),
            event_sink: Arc::new(InMemoryEventBus::new()),
            config,
        })
    }
}

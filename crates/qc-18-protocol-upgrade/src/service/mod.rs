//! Protocol Upgrade Service - Core business logic
//!
//! # Architecture
//! - Decision computation is a pure function of finalized state read
//!   through the outbound ports; it takes no locks of its own.
//! - Decisions are memoized per boundary epoch, first in memory, then in
//!   the decision store. A stored decision is never recomputed.
//! - Any missing consensus-critical state aborts the decision. There is no
//!   fallback version.

use crate::domain::{
    decision_epoch, declared_version_for, first_declarations, produce_header, Declaration,
    EpochVersionDecision, HeaderTemplate, ProtocolUpgradeConfig, UpgradeError, UpgradeResult,
    VersionTally,
};
use crate::events::ProtocolVersionDecided;
use crate::metrics;
use crate::ports::{DecisionStore, EpochManager, FinalizedChain, ProtocolUpgradeApi, UpgradeEventSink};
use parking_lot::RwLock;
use shared_types::{short_id, BlockHeader, BlockHeight, EpochId, Hash, ProtocolVersion};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Protocol Upgrade Service
pub struct ProtocolUpgradeService<E, C, D, S>
where
    E: EpochManager,
    C: FinalizedChain,
    D: DecisionStore,
    S: UpgradeEventSink,
{
    epoch_manager: Arc<E>,
    chain: Arc<C>,
    decision_store: Arc<D>,
    event_sink: Arc<S>,
    config: ProtocolUpgradeConfig,
    cache: RwLock<BTreeMap<EpochId, EpochVersionDecision>>,
}

/// Dependencies for ProtocolUpgradeService
pub struct ProtocolUpgradeDependencies<E, C, D, S> {
    pub epoch_manager: Arc<E>,
    pub chain: Arc<C>,
    pub decision_store: Arc<D>,
    pub event_sink: Arc<S>,
    pub config: ProtocolUpgradeConfig,
}

impl<E, C, D, S> ProtocolUpgradeService<E, C, D, S>
where
    E: EpochManager,
    C: FinalizedChain,
    D: DecisionStore,
    S: UpgradeEventSink,
{
    /// Create a new ProtocolUpgradeService
    ///
    /// Fails if the configuration could not be used for consensus.
    pub fn new(deps: ProtocolUpgradeDependencies<E, C, D, S>) -> UpgradeResult<Self> {
        deps.config.validate()?;
        info!(
            "[qc-18] Protocol upgrade service ready (binary v{}, window {} epochs, threshold {}/{})",
            deps.config.protocol_version,
            deps.config.num_epochs,
            deps.config.threshold.numerator,
            deps.config.threshold.denominator
        );
        Ok(Self {
            epoch_manager: deps.epoch_manager,
            chain: deps.chain,
            decision_store: deps.decision_store,
            event_sink: deps.event_sink,
            config: deps.config,
            cache: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn config(&self) -> &ProtocolUpgradeConfig {
        &self.config
    }

    /// Build a header carrying this node's declaration.
    pub fn produce_header(&self, template: HeaderTemplate) -> BlockHeader {
        produce_header(&self.config, template)
    }

    /// Compute the decision for the boundary at the end of `boundary_epoch`.
    ///
    /// Reads only finalized state and touches neither cache nor store.
    pub fn compute(&self, boundary_epoch: EpochId) -> UpgradeResult<EpochVersionDecision> {
        let em = &self.epoch_manager;
        let decision_epoch =
            decision_epoch(boundary_epoch, self.config.num_epochs, |e| em.prev_epoch(e))?;

        let headers = self.chain.headers_in_epoch(decision_epoch)?;
        let declarations = headers
            .iter()
            .map(|header| -> UpgradeResult<Declaration> {
                let author = em.block_producer(decision_epoch, header.height)?;
                if author != header.author {
                    warn!(
                        "[qc-18] Header at height {} names author {}, assigned producer is {}",
                        header.height,
                        short_id(&header.author),
                        short_id(&author)
                    );
                }
                Ok(Declaration {
                    height: header.height,
                    author,
                    version: header.declared_version,
                })
            })
            .collect::<UpgradeResult<Vec<_>>>()?;

        let first = first_declarations(declarations);
        let stakes = em.stake_table(decision_epoch)?;
        let tally = VersionTally::aggregate(&first, &stakes)?;
        let total_stake = em.total_stake(decision_epoch)?;
        // A version adopted after the decision epoch is already live at the
        // boundary and must not be rolled back.
        let previous_version = self
            .version_active_in(decision_epoch)?
            .max(self.version_active_in(boundary_epoch)?);

        debug!(
            "[qc-18] Tallied {} declarations from {} blocks of {}",
            first.len(),
            headers.len(),
            decision_epoch
        );

        Ok(EpochVersionDecision::resolve(
            boundary_epoch,
            decision_epoch,
            previous_version,
            tally,
            total_stake,
            self.config.threshold,
        ))
    }

    /// Version active in `epoch`; genesis runs the configured genesis version.
    fn version_active_in(&self, epoch: EpochId) -> UpgradeResult<ProtocolVersion> {
        match self.epoch_manager.prev_epoch(epoch)? {
            None => Ok(self.config.genesis_protocol_version),
            Some(_) => self.epoch_manager.protocol_version(epoch),
        }
    }

    fn lookup(&self, boundary_epoch: EpochId) -> UpgradeResult<Option<EpochVersionDecision>> {
        if let Some(decision) = self.cache.read().get(&boundary_epoch) {
            return Ok(Some(decision.clone()));
        }
        let stored = self.decision_store.load(boundary_epoch)?;
        if let Some(decision) = &stored {
            self.cache
                .write()
                .entry(boundary_epoch)
                .or_insert_with(|| decision.clone());
        }
        Ok(stored)
    }

    fn report(&self, err: UpgradeError) -> UpgradeError {
        if let UpgradeError::MissingHistoricalState { state, .. } = &err {
            metrics::record_missing_state(state.kind());
        }
        error!("[qc-18] Cannot decide protocol version: {}", err);
        err
    }

    fn announce(&self, decision: &EpochVersionDecision) {
        metrics::record_decision(
            decision.is_upgrade(),
            decision.version,
            decision.winning_share_bps(),
        );
        if decision.is_upgrade() {
            info!(
                "[qc-18] Protocol v{} adopted after {} ({} bps of stake in {})",
                decision.version,
                decision.boundary_epoch,
                decision.winning_share_bps(),
                decision.decision_epoch
            );
        } else {
            debug!(
                "[qc-18] Protocol stays at v{} after {} (winner {:?}, threshold met: {})",
                decision.version, decision.boundary_epoch, decision.winner, decision.threshold_met
            );
        }
        if let Err(e) = self.event_sink.publish(ProtocolVersionDecided::from(decision)) {
            warn!("[qc-18] Failed to publish decision event: {}", e);
        }
    }
}

impl<E, C, D, S> ProtocolUpgradeApi for ProtocolUpgradeService<E, C, D, S>
where
    E: EpochManager,
    C: FinalizedChain,
    D: DecisionStore,
    S: UpgradeEventSink,
{
    fn decide(&self, last_block: &Hash) -> UpgradeResult<ProtocolVersion> {
        let epoch = self
            .epoch_manager
            .epoch_of(last_block)
            .map_err(|e| self.report(e))?;
        self.decision_for(epoch).map(|d| d.version)
    }

    fn decision_for(&self, boundary_epoch: EpochId) -> UpgradeResult<EpochVersionDecision> {
        if let Some(decision) = self.lookup(boundary_epoch)? {
            metrics::record_cache_hit();
            return Ok(decision);
        }

        let decision = self
            .compute(boundary_epoch)
            .map_err(|e| self.report(e))?;
        self.decision_store.store(&decision)?;
        self.announce(&decision);

        // A concurrent caller may have computed the same boundary; both
        // results are identical, keep the first.
        let cached = self
            .cache
            .write()
            .entry(boundary_epoch)
            .or_insert(decision)
            .clone();
        Ok(cached)
    }

    fn cached_decision(&self, boundary_epoch: EpochId) -> Option<EpochVersionDecision> {
        self.cache.read().get(&boundary_epoch).cloned()
    }

    fn declared_version_for(&self, height: BlockHeight) -> ProtocolVersion {
        declared_version_for(&self.config, height)
    }
}

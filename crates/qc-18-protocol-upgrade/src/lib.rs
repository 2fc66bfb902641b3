//! # qc-18-protocol-upgrade
//!
//! Protocol Upgrade subsystem for Quantum-Chain.
//!
//! ## Architecture
//!
//! Every block header records the highest protocol version its producer's
//! binary supports. At each epoch boundary, independent nodes look back a
//! fixed number of epochs, tally those declarations by stake and agree on
//! the protocol version for the next epoch without any coordination beyond
//! the finalized chain itself.
//!
//! ```text
//! Block production ──declared_version──→ [Finalized chain]
//!                                              │
//!          [Epoch manager] ──stakes, producers─┤
//!                                              ↓
//!                              ProtocolUpgradeService::decide
//!                                              │
//!                        ProtocolVersionDecided ──→ [Event sink]
//! ```
//!
//! ### Decision rules
//!
//! - Decision epoch: `num_epochs` before the boundary, or genesis.
//! - Only each author's first declaration in the decision epoch counts.
//! - The most-staked version wins, ties to the lower version.
//! - It is adopted only with at least the threshold share of total stake
//!   (80% by default). Otherwise the active version stays.
//! - The protocol version never decreases.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_18_protocol_upgrade::{ProtocolUpgradeService, ProtocolUpgradeDependencies};
//! use qc_18_protocol_upgrade::ports::ProtocolUpgradeApi;
//!
//! let service = ProtocolUpgradeService::new(ProtocolUpgradeDependencies {
//!     epoch_manager,
//!     chain,
//!     decision_store,
//!     event_sink,
//!     config: ProtocolUpgradeConfig::default(),
//! })?;
//!
//! let next_version = service.decide(&last_block_hash)?;
//! ```
//!
//! ## Errors
//!
//! Missing historical state is fatal for the caller: block production and
//! validation stop rather than run on a guessed protocol version.

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{EnvelopeChainStore, InMemoryDecisionStore, InMemoryEpochManager, InMemoryEventBus};
pub use domain::{
    check_release, ChangeKind, ChangeSet, ClientVersion, ConfigError, EpochVersionDecision,
    HeaderTemplate, HistoricalState, PolicyError, ProtocolUpgradeConfig, StakeThreshold,
    UpgradeError, UpgradeResult, UpgradeVoteSchedule, VersionBump, VersionTally,
    GENESIS_PROTOCOL_VERSION, PROTOCOL_UPGRADE_BLOCK_THRESHOLD, PROTOCOL_UPGRADE_NUM_EPOCHS,
    PROTOCOL_VERSION,
};
pub use events::ProtocolVersionDecided;
pub use ports::{DecisionStore, EpochManager, FinalizedChain, ProtocolUpgradeApi, UpgradeEventSink};
pub use service::{ProtocolUpgradeDependencies, ProtocolUpgradeService};

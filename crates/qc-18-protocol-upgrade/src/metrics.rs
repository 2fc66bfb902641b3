//! # Protocol Upgrade Metrics
//!
//! Prometheus metrics for monitoring version adoption.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-protocol-upgrade = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `protocol_upgrade_decisions_total` - Counter of computed decisions (by outcome)
//! - `protocol_upgrade_cache_hits_total` - Counter of decisions served from cache or store
//! - `protocol_upgrade_missing_state_total` - Counter of missing historical state (by kind)
//! - `protocol_upgrade_winning_share_bps` - Gauge of the last winning stake share
//! - `protocol_upgrade_active_version` - Gauge of the last decided protocol version

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Decisions computed, labeled by outcome (`adopted` or `unchanged`)
    pub static ref DECISIONS: IntCounterVec = register_int_counter_vec!(
        "protocol_upgrade_decisions_total",
        "Total number of epoch version decisions computed",
        &["outcome"]
    )
    .expect("Failed to create DECISIONS metric");

    /// Decisions answered without recomputation
    pub static ref CACHE_HITS: IntCounter = register_int_counter!(
        "protocol_upgrade_cache_hits_total",
        "Total number of decisions served from cache or store"
    )
    .expect("Failed to create CACHE_HITS metric");

    /// Missing historical state, labeled by what was missing
    pub static ref MISSING_STATE: IntCounterVec = register_int_counter_vec!(
        "protocol_upgrade_missing_state_total",
        "Total number of decisions aborted on missing historical state",
        &["kind"]
    )
    .expect("Failed to create MISSING_STATE metric");

    /// Winning share of the last decision in basis points
    pub static ref WINNING_SHARE_BPS: IntGauge = register_int_gauge!(
        "protocol_upgrade_winning_share_bps",
        "Winning stake share of the last decision in basis points"
    )
    .expect("Failed to create WINNING_SHARE_BPS metric");

    /// Version decided at the last boundary
    pub static ref ACTIVE_VERSION: IntGauge = register_int_gauge!(
        "protocol_upgrade_active_version",
        "Protocol version decided at the last epoch boundary"
    )
    .expect("Failed to create ACTIVE_VERSION metric");
}

/// Record a computed decision
#[cfg(feature = "metrics")]
pub fn record_decision(adopted: bool, version: u32, winning_share_bps: u64) {
    let outcome = if adopted { "adopted" } else { "unchanged" };
    DECISIONS.with_label_values(&[outcome]).inc();
    ACTIVE_VERSION.set(i64::from(version));
    WINNING_SHARE_BPS.set(i64::try_from(winning_share_bps).unwrap_or(i64::MAX));
}

/// Record a decision served without recomputation
#[cfg(feature = "metrics")]
pub fn record_cache_hit() {
    CACHE_HITS.inc();
}

/// Record missing historical state by kind
#[cfg(feature = "metrics")]
pub fn record_missing_state(kind: &str) {
    MISSING_STATE.with_label_values(&[kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_decision(_adopted: bool, _version: u32, _winning_share_bps: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_cache_hit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_missing_state(_kind: &str) {}

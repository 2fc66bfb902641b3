//! Domain layer for the Protocol Upgrade subsystem
//!
//! Pure functions and value types; nothing here touches storage or locks.
//! - config: chain-level adoption policy
//! - window: decision epoch look-back
//! - tally: first-declaration fold and stake aggregation
//! - decision: threshold and no-downgrade rules, persisted decision shapes
//! - ledger: the version a producer writes into its headers
//! - client_policy: release version bumps for client binaries

mod client_policy;
mod config;
mod decision;
mod error;
mod ledger;
mod tally;
mod window;

pub use client_policy::*;
pub use config::*;
pub use decision::*;
pub use error::*;
pub use ledger::*;
pub use tally::*;
pub use window::*;

//! Adapters layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by tests and by
//! single-process simulations of several nodes.

mod chain_store;
mod decision_store;
mod epoch_manager;
mod event_bus;

pub use chain_store::*;
pub use decision_store::*;
pub use epoch_manager::*;
pub use event_bus::*;

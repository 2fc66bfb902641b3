//! # Quantum-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Simulated finalized chain shared by tests and benches
//! ├── benchmarks/       # Performance tests per subsystem
//! │   └── qc_18_protocol_upgrade.rs
//! │
//! └── integration/      # Cross-crate flows
//!     ├── upgrade_flows.rs
//!     └── envelope_storage.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod fixtures;

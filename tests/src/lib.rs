//! # MSP Identity Cache Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs       # In-memory provider and block builders
//! │   └── integration/      # Cross-crate flows
//! └── benches/
//!     └── cache_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p msp-tests
//!
//! # Benchmarks
//! cargo bench -p msp-tests
//! ```

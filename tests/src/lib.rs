//! # Quantum-Chain Group Node Test Suite
//!
//! Cross-crate tests for the group manager (qc-18) and group RPC (qc-19).
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs    # Lifecycle and proof walkthroughs
//!     ├── http_flow.rs    # Same flows over HTTP JSON-RPC
//!     ├── concurrency.rs  # Racing lifecycle calls and queries
//!     └── recovery.rs     # Boot from persisted group files
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod integration;

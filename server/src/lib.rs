//! PEM Ranker server — thin facade over the core and http crates.
//!
//! Re-exports the pipeline and handlers so the binary and the integration
//! tests use one set of import paths.

pub use pemrank_core::*;

pub use pemrank_http as api;

//! HTTP API layer for the PEM Ranker service.

pub mod api;

pub use api::{api_health, api_rank, router};

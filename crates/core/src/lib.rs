//! PEM Ranker core — a stateless pipeline that selects, from past Python
//! Error Message events of the same type, the few most pedagogically useful
//! to show alongside the PEM a learner just hit.
//!
//! The pipeline is pure and request-scoped: score every candidate over seven
//! feature channels, apply the hard skeleton filter, suppress near-duplicate
//! occurrences, pick a diverse Top-K with MMR, and explain every selection
//! with a fixed reason vocabulary — or abstain when confidence is too low.

pub mod dedup;
pub mod features;
pub mod mmr;
pub mod normalize;
pub mod rank;
pub mod reasons;
pub mod schemas;
pub mod score;

#[cfg(test)]
pub(crate) mod testutil;

pub use rank::rank;
pub use schemas::{
    AbstainReason, Candidate, QueryContext, RankParams, RankRequest, RankResponse, RankedItem,
    ValidationError,
};

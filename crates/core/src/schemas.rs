//! Request and response contract between the coordinator and the ranker.
//!
//! The schema is strict: unknown fields anywhere in the payload are rejected,
//! numeric ranges are enforced by [`RankRequest::validate`] before the
//! pipeline runs, and package lists are normalized on deserialization.
//! The ranker keeps no state across requests; every tuning knob lives in
//! [`RankParams`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use thiserror::Error;

use crate::features::Features;

// ---------------------------------------------------------------------------
// Boundary errors
// ---------------------------------------------------------------------------

/// A request field that failed range validation. Schema-shape violations
/// (unknown or missing fields, wrong types) are caught earlier by serde.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ValidationError {
    ValidationError { field: field.into(), reason: reason.into() }
}

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

/// Selection and diversity controls. Every field is tunable per request and
/// defaults to the production tuning when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankParams {
    /// How many items to select; the response carries best + up to k-1 alternates.
    #[serde(default = "default_k")]
    pub k: u32,
    /// MMR tradeoff between score and novelty.
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
    /// Abstain when the best pre-MMR score is below this.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Half-life for exponential recency decay, in days.
    #[serde(default = "default_recency_half_life_days")]
    pub recency_half_life_days: f64,
    /// Hard-drop candidates whose skeleton similarity falls below this
    /// (only when the query skeleton is informative).
    #[serde(default = "default_skeleton_filter_threshold")]
    pub skeleton_filter_threshold: f64,
    /// Minimum resolutionDepth for a same-skeleton-and-file repeat.
    #[serde(default = "default_allow_repeat_depth")]
    pub allow_repeat_depth: u8,
    /// Minimum hours a repeat must be older than the primary.
    #[serde(default = "default_allow_repeat_min_hours")]
    pub allow_repeat_min_hours: f64,
    /// Cap for the resolution-success bonus contribution.
    #[serde(default = "default_success_bonus_alpha")]
    pub success_bonus_alpha: f64,
}

fn default_k() -> u32 {
    3
}
fn default_mmr_lambda() -> f64 {
    0.7
}
fn default_confidence_floor() -> f64 {
    0.5
}
fn default_recency_half_life_days() -> f64 {
    14.0
}
fn default_skeleton_filter_threshold() -> f64 {
    0.6
}
fn default_allow_repeat_depth() -> u8 {
    3
}
fn default_allow_repeat_min_hours() -> f64 {
    24.0
}
fn default_success_bonus_alpha() -> f64 {
    0.03
}

impl Default for RankParams {
    fn default() -> Self {
        RankParams {
            k: default_k(),
            mmr_lambda: default_mmr_lambda(),
            confidence_floor: default_confidence_floor(),
            recency_half_life_days: default_recency_half_life_days(),
            skeleton_filter_threshold: default_skeleton_filter_threshold(),
            allow_repeat_depth: default_allow_repeat_depth(),
            allow_repeat_min_hours: default_allow_repeat_min_hours(),
            success_bonus_alpha: default_success_bonus_alpha(),
        }
    }
}

impl RankParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.k) {
            return Err(invalid("params.k", "must be between 1 and 10"));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(invalid("params.mmr_lambda", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(invalid("params.confidence_floor", "must be in [0, 1]"));
        }
        if !(self.recency_half_life_days > 0.0) {
            return Err(invalid("params.recency_half_life_days", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.skeleton_filter_threshold) {
            return Err(invalid("params.skeleton_filter_threshold", "must be in [0, 1]"));
        }
        if self.allow_repeat_depth > 3 {
            return Err(invalid("params.allow_repeat_depth", "must be between 0 and 3"));
        }
        if !(self.allow_repeat_min_hours >= 0.0) {
            return Err(invalid("params.allow_repeat_min_hours", "must be >= 0"));
        }
        if !(0.0..=0.2).contains(&self.success_bonus_alpha) {
            return Err(invalid("params.success_bonus_alpha", "must be in [0, 0.2]"));
        }
        Ok(())
    }
}

/// Context about the PEM the learner just hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryContext {
    pub student_id: String,
    #[serde(rename = "pemType")]
    pub pem_type: String,
    #[serde(rename = "pemSkeleton")]
    pub pem_skeleton: String,
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "activeFile_hash")]
    pub active_file_hash: String,
    #[serde(rename = "workingDirectory_hash")]
    pub working_directory_hash: String,
    #[serde(rename = "directoryTree", default)]
    pub directory_tree: Vec<String>,
    #[serde(default, deserialize_with = "de_packages")]
    pub packages: Vec<String>,
    #[serde(rename = "pythonVersion")]
    pub python_version: String,
    #[serde(rename = "resolutionDepth", default)]
    pub resolution_depth: Option<u8>,
    /// Point id of the query PEM in the vector store; accepted from the
    /// coordinator but unused by the ranker.
    #[serde(default)]
    pub current_pem_point_id: Option<String>,
    /// Masked local code window. The embedder already consumed it; the ranker
    /// only sees the resulting `vector_similarity`.
    #[serde(default)]
    pub code_slice: Option<String>,
}

impl QueryContext {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(depth) = self.resolution_depth {
            if depth > 3 {
                return Err(invalid("query.resolutionDepth", "must be between 0 and 3"));
            }
        }
        Ok(())
    }
}

/// One past PEM of the same type, prepared by the coordinator and tagged with
/// a precomputed code-slice cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Candidate {
    pub id: String,
    pub vector_similarity: f64,
    #[serde(rename = "pemSkeleton")]
    pub pem_skeleton: String,
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "activeFile_hash")]
    pub active_file_hash: String,
    #[serde(rename = "workingDirectory_hash")]
    pub working_directory_hash: String,
    #[serde(rename = "directoryTree", default)]
    pub directory_tree: Vec<String>,
    #[serde(default, deserialize_with = "de_packages")]
    pub packages: Vec<String>,
    #[serde(rename = "pythonVersion")]
    pub python_version: String,
    #[serde(rename = "resolutionDepth", default)]
    pub resolution_depth: Option<u8>,
    /// File extension like `.py`, reserved for the extension-affinity file
    /// signal; currently unused.
    #[serde(rename = "activeFile_ext", default)]
    pub active_file_ext: Option<String>,
}

impl Candidate {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.vector_similarity) {
            return Err(invalid(
                format!("candidates[{index}].vector_similarity"),
                "must be in [0, 1]",
            ));
        }
        if let Some(depth) = self.resolution_depth {
            if depth > 3 {
                return Err(invalid(
                    format!("candidates[{index}].resolutionDepth"),
                    "must be between 0 and 3",
                ));
            }
        }
        Ok(())
    }
}

/// Top-level `/rank` request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankRequest {
    #[serde(default)]
    pub params: RankParams,
    pub query: QueryContext,
    pub candidates: Vec<Candidate>,
}

impl RankRequest {
    /// Range-check every numeric field. Called at the HTTP boundary before
    /// the pipeline runs; the core assumes validated input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.params.validate()?;
        self.query.validate()?;
        for (index, cand) in self.candidates.iter().enumerate() {
            cand.validate(index)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

/// Why the ranker declined to recommend. Abstention is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstainReason {
    NoCandidates,
    AllFiltered,
    AllDeduped,
    LowConfidence,
}

/// A selected result with its transparent feature breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub id: String,
    pub score: f64,
    pub features: Features,
    pub reasons: Vec<String>,
}

/// Ranker response. When `abstain` is true, `best` is null and `alternates`
/// is empty.
#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub abstain: bool,
    pub reason: Option<AbstainReason>,
    pub best: Option<RankedItem>,
    pub alternates: Vec<RankedItem>,
}

impl RankResponse {
    pub fn abstain(reason: AbstainReason) -> Self {
        RankResponse { abstain: true, reason: Some(reason), best: None, alternates: Vec::new() }
    }
}

// ---------------------------------------------------------------------------
// Ingress normalization
// ---------------------------------------------------------------------------

/// Normalize a package list: lowercase, strip version specifiers and anything
/// after them, drop empties, dedup preserving first occurrence. Idempotent.
pub fn normalize_packages<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in raw {
        let mut name = item.trim().to_lowercase();
        for sep in ["==", ">=", "<=", "~="] {
            if let Some(idx) = name.find(sep) {
                name.truncate(idx);
            }
        }
        let name = name.trim_end().to_string();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

fn de_packages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_packages(raw))
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse an ISO-8601 timestamp. Values without an explicit offset are naive
/// and interpreted as UTC, never local time, so recency stays deterministic
/// across hosts.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("invalid ISO-8601 timestamp: {raw:?}"))
}

mod utc_timestamp {
    use super::*;

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

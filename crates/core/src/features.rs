//! Per-candidate feature extraction.
//!
//! Seven pure channels, each in [0,1]. Features only ever down-weight or
//! up-weight a candidate; none of them remove items (the hard skeleton
//! filter lives in the scorer).

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::normalize::skeleton_similarity;
use crate::schemas::{Candidate, QueryContext, RankParams};

/// Channel count, used by the scorer for the uniform renormalization fallback.
pub const CHANNEL_COUNT: usize = 7;

/// One feature vector, in the fixed channel order used by the scorer.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Features {
    pub skeleton: f64,
    pub vector: f64,
    pub recency: f64,
    pub project: f64,
    pub file: f64,
    pub packages: f64,
    pub pyver: f64,
}

impl Features {
    /// Channel values in scorer order: skeleton, vector, recency, project,
    /// file, packages, pyver.
    pub fn to_array(self) -> [f64; CHANNEL_COUNT] {
        [self.skeleton, self.vector, self.recency, self.project, self.file, self.packages, self.pyver]
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Features {
        Features {
            skeleton: f(self.skeleton),
            vector: f(self.vector),
            recency: f(self.recency),
            project: f(self.project),
            file: f(self.file),
            packages: f(self.packages),
            pyver: f(self.pyver),
        }
    }
}

// ---------------------------------------------------------------------------
// Set and time helpers
// ---------------------------------------------------------------------------

/// Jaccard index of two string collections. Empty-vs-empty is 0.0, not 1.0.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let sa: HashSet<&str> = a.iter().map(String::as_str).collect();
    let sb: HashSet<&str> = b.iter().map(String::as_str).collect();
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Exponential recency decay: `0.5 ^ (delta_days / half_life)`.
///
/// Candidates from the future (clock skew) clamp to delta 0, i.e. full weight.
pub fn recency_score(now: DateTime<Utc>, then: DateTime<Utc>, half_life_days: f64) -> f64 {
    let delta_days = ((now - then).num_milliseconds() as f64 / 86_400_000.0).max(0.0);
    0.5_f64.powf(delta_days / half_life_days.max(1e-6))
}

pub fn hours_between(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / 3_600_000.0
}

// ---------------------------------------------------------------------------
// Python version proximity
// ---------------------------------------------------------------------------

static PYVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.(\d+)").unwrap());

/// Parse `"M.m"` from a version string; anything unparsable maps to (0,0).
pub fn parse_pyver(v: &str) -> (u32, u32) {
    match PYVER_RE.captures(v) {
        Some(c) => {
            let major = c[1].parse().unwrap_or(0);
            let minor = c[2].parse().unwrap_or(0);
            (major, minor)
        }
        None => (0, 0),
    }
}

pub fn pyver_proximity(qv: &str, cv: &str) -> f64 {
    let (q_major, q_minor) = parse_pyver(qv);
    let (c_major, c_minor) = parse_pyver(cv);
    if q_major == c_major && q_minor == c_minor {
        1.0
    } else if q_major == c_major {
        0.8
    } else {
        0.6
    }
}

// ---------------------------------------------------------------------------
// Context affinity channels
// ---------------------------------------------------------------------------

/// 1.0 on an exact file-hash match, else 0.0. An extension-affinity mid-range
/// is reserved for later; see the reason builder.
pub fn file_affinity(query: &QueryContext, cand: &Candidate) -> f64 {
    if cand.active_file_hash == query.active_file_hash {
        1.0
    } else {
        0.0
    }
}

/// 1.0 for the same working directory, else the directory-tree overlap.
pub fn project_fingerprint(query: &QueryContext, cand: &Candidate) -> f64 {
    if cand.working_directory_hash == query.working_directory_hash {
        1.0
    } else {
        jaccard(&query.directory_tree, &cand.directory_tree)
    }
}

pub fn package_overlap(query: &QueryContext, cand: &Candidate) -> f64 {
    jaccard(&query.packages, &cand.packages)
}

// ---------------------------------------------------------------------------
// Full extraction
// ---------------------------------------------------------------------------

/// Compute the normalized feature vector for one candidate.
pub fn compute_features(query: &QueryContext, cand: &Candidate, params: &RankParams) -> Features {
    Features {
        skeleton: skeleton_similarity(&query.pem_skeleton, &cand.pem_skeleton),
        vector: cand.vector_similarity.clamp(0.0, 1.0),
        recency: recency_score(query.timestamp, cand.timestamp, params.recency_half_life_days),
        project: project_fingerprint(query, cand),
        file: file_affinity(query, cand),
        packages: package_overlap(query, cand),
        pyver: pyver_proximity(&query.python_version, &cand.python_version),
    }
}

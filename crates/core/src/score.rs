//! Adaptive linear scoring with per-candidate reliability multipliers.
//!
//! Base weights are fixed; each candidate scales them by how trustworthy a
//! channel is for *that* candidate (a near-exact skeleton match is strong
//! evidence, a barely-similar one is weak), then the weights renormalize to
//! sum to 1 so scores stay comparable across candidates.

use crate::features::{compute_features, Features, CHANNEL_COUNT};
use crate::normalize::{normalize, skeleton_informative};
use crate::schemas::{Candidate, QueryContext, RankParams};

/// Base channel weights in feature order: skeleton, vector, recency, project,
/// file, packages, pyver.
pub const BASE_WEIGHTS: [f64; CHANNEL_COUNT] = [0.40, 0.35, 0.10, 0.07, 0.03, 0.03, 0.02];

/// Sentinel score for candidates dropped by the hard skeleton filter.
pub const FILTERED: f64 = -1.0;

/// A candidate with its computed features and final score. `norm_skeleton`
/// is cached here because the deduper and the MMR selector both key on it.
pub struct Scored<'a> {
    pub features: Features,
    pub score: f64,
    pub norm_skeleton: String,
    pub cand: &'a Candidate,
}

/// Map `resolutionDepth` to a success value: unresolved or unknown is 0.0,
/// partially resolved 0.5, fully resolved 1.0.
pub fn depth_to_success(depth: Option<u8>) -> f64 {
    match depth {
        Some(d) if d >= 2 => 1.0,
        Some(1) => 0.5,
        _ => 0.0,
    }
}

/// Per-candidate reliability scaling for each channel, in feature order.
pub fn reliability_multipliers(
    features: &Features,
    query: &QueryContext,
    cand: &Candidate,
) -> [f64; CHANNEL_COUNT] {
    let mut r = [1.0; CHANNEL_COUNT];

    r[0] = match features.skeleton {
        s if s >= 0.999 => 1.4,
        s if s >= 0.9 => 1.2,
        s if s >= 0.8 => 1.0,
        s if s >= 0.6 => 0.7,
        _ => 0.5,
    };

    r[3] = if cand.working_directory_hash == query.working_directory_hash
        || features.project >= 0.5
    {
        1.2
    } else {
        0.9
    };

    r
}

/// Base weights scaled by reliability, renormalized to sum to 1. A zero sum
/// falls back to uniform 1/N weights.
pub fn effective_weights(reliability: &[f64; CHANNEL_COUNT]) -> [f64; CHANNEL_COUNT] {
    let mut weights = [0.0; CHANNEL_COUNT];
    let mut sum = 0.0;
    for i in 0..CHANNEL_COUNT {
        weights[i] = (BASE_WEIGHTS[i] * reliability[i]).max(0.0);
        sum += weights[i];
    }
    if sum <= 0.0 {
        return [1.0 / CHANNEL_COUNT as f64; CHANNEL_COUNT];
    }
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Score one candidate: features, hard skeleton filter, adaptive weighted
/// sum plus a bounded success bonus, clamped to [0,1].
pub fn score_candidate<'a>(
    query: &QueryContext,
    cand: &'a Candidate,
    params: &RankParams,
) -> Scored<'a> {
    let features = compute_features(query, cand, params);
    let norm_skeleton = normalize(&cand.pem_skeleton);

    if features.skeleton < params.skeleton_filter_threshold
        && skeleton_informative(&query.pem_skeleton)
    {
        return Scored { features, score: FILTERED, norm_skeleton, cand };
    }

    let weights = effective_weights(&reliability_multipliers(&features, query, cand));
    let base: f64 = weights.iter().zip(features.to_array()).map(|(w, f)| w * f).sum();
    let success = depth_to_success(cand.resolution_depth);
    let score = (base + params.success_bonus_alpha * success).clamp(0.0, 1.0);

    Scored { features, score, norm_skeleton, cand }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{candidate, query};
    use approx::assert_relative_eq;

    #[test]
    fn base_weights_sum_to_one() {
        assert_relative_eq!(BASE_WEIGHTS.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn effective_weights_always_sum_to_one() {
        let r = [1.4, 1.0, 1.0, 1.2, 1.0, 1.0, 1.0];
        let w = effective_weights(&r);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_weight_sum_falls_back_to_uniform() {
        let w = effective_weights(&[0.0; CHANNEL_COUNT]);
        for wi in w {
            assert_relative_eq!(wi, 1.0 / 7.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn depth_to_success_mapping() {
        assert_eq!(depth_to_success(None), 0.0);
        assert_eq!(depth_to_success(Some(0)), 0.0);
        assert_eq!(depth_to_success(Some(1)), 0.5);
        assert_eq!(depth_to_success(Some(2)), 1.0);
        assert_eq!(depth_to_success(Some(3)), 1.0);
    }

    #[test]
    fn identical_candidate_scores_near_one() {
        let q = query();
        let mut c = candidate("c1");
        c.vector_similarity = 1.0;
        c.timestamp = q.timestamp;
        c.packages = q.packages.clone();
        c.resolution_depth = Some(3);
        let params = RankParams::default();
        let s = score_candidate(&q, &c, &params);
        // Every feature is 1.0, so the weighted sum is 1.0 and the bonus clamps.
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn success_bonus_is_bounded_by_alpha() {
        let q = query();
        let mut resolved = candidate("a");
        resolved.resolution_depth = Some(3);
        let unresolved = candidate("b");
        let params = RankParams::default();
        let with_bonus = score_candidate(&q, &resolved, &params);
        let without = score_candidate(&q, &unresolved, &params);
        let delta = with_bonus.score - without.score;
        assert!(delta > 0.0 && delta <= params.success_bonus_alpha + 1e-12, "delta {delta}");
    }

    #[test]
    fn low_skeleton_similarity_is_filtered_when_query_informative() {
        let q = query();
        assert!(skeleton_informative(&q.pem_skeleton));
        let mut c = candidate("c1");
        c.pem_skeleton = "ZeroDivisionError: division by zero".to_string();
        let s = score_candidate(&q, &c, &RankParams::default());
        assert_eq!(s.score, FILTERED);
    }

    #[test]
    fn uninformative_query_skeleton_disables_the_filter() {
        let mut q = query();
        q.pem_skeleton = "X".to_string();
        let mut c = candidate("c1");
        c.pem_skeleton = "completely different".to_string();
        let s = score_candidate(&q, &c, &RankParams::default());
        assert!(s.score >= 0.0, "filter must be inactive for uninformative skeletons");
    }

    #[test]
    fn skeleton_reliability_tiers() {
        let q = query();
        let c = candidate("c1");
        let mut f = compute_features(&q, &c, &RankParams::default());
        f.skeleton = 1.0;
        assert_eq!(reliability_multipliers(&f, &q, &c)[0], 1.4);
        f.skeleton = 0.95;
        assert_eq!(reliability_multipliers(&f, &q, &c)[0], 1.2);
        f.skeleton = 0.85;
        assert_eq!(reliability_multipliers(&f, &q, &c)[0], 1.0);
        f.skeleton = 0.7;
        assert_eq!(reliability_multipliers(&f, &q, &c)[0], 0.7);
        f.skeleton = 0.1;
        assert_eq!(reliability_multipliers(&f, &q, &c)[0], 0.5);
    }

    #[test]
    fn project_reliability_depends_on_workdir_or_overlap() {
        let q = query();
        let mut c = candidate("c1");
        let f = compute_features(&q, &c, &RankParams::default());
        // Same working directory hash as the query fixture.
        assert_eq!(reliability_multipliers(&f, &q, &c)[3], 1.2);

        c.working_directory_hash = "W:elsewhere".to_string();
        c.directory_tree = vec![];
        let f = compute_features(&q, &c, &RankParams::default());
        assert_eq!(reliability_multipliers(&f, &q, &c)[3], 0.9);
    }
}

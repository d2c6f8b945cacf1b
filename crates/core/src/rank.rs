//! Request-scoped ranking pipeline: score, filter, dedupe, select, explain.
//!
//! Abstention is a normal outcome here, never an error; the only failure mode
//! the service surfaces lives at the schema boundary.

use rayon::prelude::*;
use tracing::debug;

use crate::dedup::dedup_scored;
use crate::mmr::mmr_select;
use crate::reasons::reasons_for;
use crate::schemas::{AbstainReason, RankRequest, RankResponse, RankedItem};
use crate::score::{score_candidate, Scored};

/// Rank a validated request. Deterministic: identical requests produce
/// identical responses.
pub fn rank(req: &RankRequest) -> RankResponse {
    let params = &req.params;
    let query = &req.query;

    if req.candidates.is_empty() {
        return RankResponse::abstain(AbstainReason::NoCandidates);
    }

    // Feature extraction and scoring are pure per candidate; order is
    // preserved by the parallel collect.
    let mut scored: Vec<Scored> =
        req.candidates.par_iter().map(|c| score_candidate(query, c, params)).collect();
    let total = scored.len();
    scored.retain(|s| s.score >= 0.0);
    debug!(total, kept = scored.len(), "scored candidates");
    if scored.is_empty() {
        return RankResponse::abstain(AbstainReason::AllFiltered);
    }

    let scored = dedup_scored(scored, params);
    if scored.is_empty() {
        return RankResponse::abstain(AbstainReason::AllDeduped);
    }

    if scored[0].score < params.confidence_floor {
        debug!(
            top_score = scored[0].score,
            floor = params.confidence_floor,
            "abstaining below confidence floor"
        );
        return RankResponse::abstain(AbstainReason::LowConfidence);
    }

    let k = (params.k as usize).min(scored.len()).max(1);
    let mut chosen = mmr_select(scored, k, params.mmr_lambda);
    chosen.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut items: Vec<RankedItem> = chosen
        .iter()
        .map(|s| RankedItem {
            id: s.cand.id.clone(),
            score: round6(s.score),
            features: s.features.map(round6),
            reasons: reasons_for(s, query),
        })
        .collect();

    let best = items.remove(0);
    debug!(best = best.id.as_str(), alternates = items.len(), "ranked");
    RankResponse { abstain: false, reason: None, best: Some(best), alternates: items }
}

/// Round to six fractional digits for stable wire output.
fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

//! Diversity selection via Maximal Marginal Relevance.
//!
//! Greedy Top-K: always take the strongest item first, then repeatedly take
//! the candidate maximizing `lambda * score - (1 - lambda) * max_sim` against
//! everything already selected. Ties go to the earlier (higher-ranked) item,
//! which keeps selection deterministic.

use crate::features::jaccard;
use crate::score::Scored;

/// Inter-candidate similarity for MMR. Two empty file hashes never count as
/// the same file.
pub fn candidate_similarity(a: &Scored, b: &Scored) -> f64 {
    let file_a = &a.cand.active_file_hash;
    let file_b = &b.cand.active_file_hash;
    if !file_a.is_empty() && !file_b.is_empty() && file_a == file_b {
        return 1.0;
    }
    if a.norm_skeleton == b.norm_skeleton {
        return 0.8;
    }
    jaccard(&a.cand.packages, &b.cand.packages)
}

/// Greedy MMR selection of up to `k` items from a score-sorted list.
pub fn mmr_select<'a>(scored: Vec<Scored<'a>>, k: usize, lambda: f64) -> Vec<Scored<'a>> {
    if k == 0 || scored.is_empty() {
        return Vec::new();
    }

    let mut remaining = scored;
    let mut selected: Vec<Scored<'a>> = Vec::with_capacity(k.min(remaining.len()));
    // The input is score-sorted, so the head is the unconditional first pick.
    selected.push(remaining.remove(0));

    while !remaining.is_empty() && selected.len() < k {
        let mut best_idx = 0;
        let mut best_val = f64::NEG_INFINITY;
        for (i, s) in remaining.iter().enumerate() {
            let sim_to_selected =
                selected.iter().map(|t| candidate_similarity(s, t)).fold(0.0, f64::max);
            let val = lambda * s.score - (1.0 - lambda) * sim_to_selected;
            if val > best_val {
                best_val = val;
                best_idx = i;
            }
        }
        let picked = remaining.remove(best_idx);
        selected.push(picked);
    }

    selected
}

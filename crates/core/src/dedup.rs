//! Duplicate suppression with a controlled repeat rule.
//!
//! Two PEMs with the same normalized skeleton in the same file are the same
//! mistake; showing both teaches nothing. The exception is a sufficiently
//! older occurrence the learner actually resolved — seeing their own past
//! fix is the most useful alternate there is.

use std::collections::HashMap;

use crate::features::hours_between;
use crate::schemas::RankParams;
use crate::score::Scored;

type DedupKey = (String, String);

/// Collapse near-duplicates, keeping per group the highest-scoring item plus
/// at most one allowed repeat: the first tail item (in score order) that is
/// at least `allow_repeat_min_hours` older than the primary and has
/// `resolutionDepth >= allow_repeat_depth`. Output is sorted score-descending.
pub fn dedup_scored<'a>(scored: Vec<Scored<'a>>, params: &RankParams) -> Vec<Scored<'a>> {
    // First-seen key order keeps output deterministic across score ties.
    let mut order: Vec<DedupKey> = Vec::new();
    let mut groups: HashMap<DedupKey, Vec<Scored<'a>>> = HashMap::new();
    for s in scored {
        if s.score < 0.0 {
            continue;
        }
        let key = (s.norm_skeleton.clone(), s.cand.active_file_hash.clone());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(s);
    }

    let mut result: Vec<Scored<'a>> = Vec::new();
    for key in &order {
        let Some(mut items) = groups.remove(key) else { continue };
        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.cand.timestamp.cmp(&a.cand.timestamp))
        });

        let mut iter = items.into_iter();
        let Some(primary) = iter.next() else { continue };
        let primary_ts = primary.cand.timestamp;

        let allowed = iter.find(|s| {
            let depth_ok =
                s.cand.resolution_depth.is_some_and(|d| d >= params.allow_repeat_depth);
            depth_ok && hours_between(primary_ts, s.cand.timestamp) >= params.allow_repeat_min_hours
        });

        result.push(primary);
        if let Some(repeat) = allowed {
            result.push(repeat);
        }
    }

    result.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    result
}

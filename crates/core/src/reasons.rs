//! Human-readable reason tags for ranked items.
//!
//! The vocabulary is fixed and small; the downstream UI keys on these exact
//! strings. Tags are driven only by feature values and the query context.

use crate::schemas::QueryContext;
use crate::score::{depth_to_success, Scored};

/// Build the ordered reason list for one selected item.
pub fn reasons_for(s: &Scored, query: &QueryContext) -> Vec<String> {
    let mut reasons = Vec::new();

    if s.features.skeleton >= 0.999 {
        reasons.push("signature match".to_string());
    } else if s.features.skeleton >= 0.8 {
        reasons.push("signature similar".to_string());
    }

    if s.features.file >= 0.999 {
        reasons.push("same file".to_string());
    } else if (0.25..0.999).contains(&s.features.file) {
        // Mid-range is reserved for an extension-affinity signal; the file
        // channel is binary today, so this branch is inert until that lands.
        reasons.push("same filetype".to_string());
    }

    if s.features.packages > 0.0 {
        reasons.push("package overlap".to_string());
    }

    let days = (query.timestamp - s.cand.timestamp).num_days().max(0);
    reasons.push(format!("recent: {days}d"));

    if depth_to_success(s.cand.resolution_depth) >= 0.5 {
        reasons.push("success before".to_string());
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::RankParams;
    use crate::score::score_candidate;
    use crate::testutil::{candidate, query, ts};

    #[test]
    fn exact_match_same_file_recent_success() {
        let q = query();
        let mut c = candidate("c1");
        c.resolution_depth = Some(2);
        let s = score_candidate(&q, &c, &RankParams::default());
        let reasons = reasons_for(&s, &q);
        assert_eq!(
            reasons,
            vec!["signature match", "same file", "package overlap", "recent: 1d", "success before"]
        );
    }

    #[test]
    fn similar_but_not_exact_signature() {
        let q = query();
        let mut c = candidate("c1");
        c.pem_skeleton = "NameError: name '<VAR>' is not define".to_string();
        let s = score_candidate(&q, &c, &RankParams::default());
        let reasons = reasons_for(&s, &q);
        assert!(reasons.contains(&"signature similar".to_string()));
        assert!(!reasons.contains(&"signature match".to_string()));
    }

    #[test]
    fn age_floors_at_zero_days() {
        let q = query();
        let mut c = candidate("c1");
        c.timestamp = ts("2025-06-12T12:00:00Z"); // ahead of the query clock
        let s = score_candidate(&q, &c, &RankParams::default());
        let reasons = reasons_for(&s, &q);
        assert!(reasons.contains(&"recent: 0d".to_string()));
    }

    #[test]
    fn partial_resolution_counts_as_success() {
        let q = query();
        let mut c = candidate("c1");
        c.resolution_depth = Some(1);
        let s = score_candidate(&q, &c, &RankParams::default());
        assert!(reasons_for(&s, &q).contains(&"success before".to_string()));

        c.resolution_depth = Some(0);
        let s = score_candidate(&q, &c, &RankParams::default());
        assert!(!reasons_for(&s, &q).contains(&"success before".to_string()));
    }

    #[test]
    fn no_package_overlap_tag_for_disjoint_sets() {
        let q = query();
        let mut c = candidate("c1");
        c.packages = vec!["requests".to_string()];
        let s = score_candidate(&q, &c, &RankParams::default());
        assert!(!reasons_for(&s, &q).contains(&"package overlap".to_string()));
    }
}

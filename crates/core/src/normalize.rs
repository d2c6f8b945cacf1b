//! Skeleton text normalization and fuzzy comparison.
//!
//! PEM skeletons arrive already masked by the canonicalizer (`<VAR>`, `<NUM>`,
//! paths, line numbers), but surface variation still leaks through: casing,
//! whitespace runs, raw numbers in library messages, absolute paths from
//! tracebacks. `normalize` collapses all of that to a canonical form so two
//! skeletons compare on structure, not noise.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());
static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]:\\[^\s]+|/(?:[^\s/]+/)+[^\s]+)").unwrap());
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]{1,32}>").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_]+").unwrap());

/// Collapse a skeleton-like string to its canonical comparison form.
///
/// Lowercases, rewrites `<...>` placeholders to `<x>`, masks numeric runs as
/// `<n>` and absolute paths as `<p>`, and collapses whitespace. The canonical
/// tokens `<x>`, `<n>`, `<p>` are fixed points, so the function is idempotent.
pub fn normalize(s: &str) -> String {
    let s = s.trim().to_lowercase();
    let s = PLACEHOLDER_RE.replace_all(&s, |caps: &regex::Captures| {
        let token = &caps[0];
        if token == "<x>" || token == "<n>" || token == "<p>" {
            token.to_string()
        } else {
            "<x>".to_string()
        }
    });
    let s = NUM_RE.replace_all(&s, "<n>");
    let s = PATH_RE.replace_all(&s, "<p>");
    WHITESPACE_RE.replace_all(&s, " ").into_owned()
}

/// Similarity of two skeletons in [0,1]: 1.0 on canonical equality, otherwise
/// a smooth edit-distance ratio over the normalized strings.
pub fn skeleton_similarity(a: &str, b: &str) -> f64 {
    let a_n = normalize(a);
    let b_n = normalize(b);
    if a_n == b_n {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a_n, &b_n).clamp(0.0, 1.0)
}

/// Whether a skeleton carries enough signal for the hard filter to apply.
///
/// Short skeletons ("X", "err") would filter almost everything; when the
/// normalized form has fewer than 4 word tokens the filter is disabled and
/// ties err towards showing the student something.
pub fn skeleton_informative(s: &str) -> bool {
    WORD_RE.find_iter(&normalize(s)).count() >= 4
}

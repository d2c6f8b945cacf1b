//! Shared fixtures for the core unit tests.

use chrono::{DateTime, Utc};

use crate::schemas::{Candidate, QueryContext};

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// A NameError query in a small two-file project.
pub fn query() -> QueryContext {
    QueryContext {
        student_id: "s1".into(),
        pem_type: "NameError".into(),
        pem_skeleton: "NameError: name '<VAR>' is not defined".into(),
        timestamp: ts("2025-06-10T12:00:00Z"),
        active_file_hash: "H:main.py".into(),
        working_directory_hash: "W:proj".into(),
        directory_tree: vec!["main.py".into(), "util/helpers.py".into()],
        packages: vec!["numpy".into(), "pandas".into()],
        python_version: "3.11.5".into(),
        resolution_depth: None,
        current_pem_point_id: None,
        code_slice: None,
    }
}

/// A candidate matching the [`query`] fixture on skeleton, file, and workdir,
/// one day older.
pub fn candidate(id: &str) -> Candidate {
    Candidate {
        id: id.into(),
        vector_similarity: 0.8,
        pem_skeleton: "NameError: name '<VAR>' is not defined".into(),
        timestamp: ts("2025-06-09T12:00:00Z"),
        active_file_hash: "H:main.py".into(),
        working_directory_hash: "W:proj".into(),
        directory_tree: vec!["main.py".into(), "util/helpers.py".into()],
        packages: vec!["numpy".into()],
        python_version: "3.11.5".into(),
        resolution_depth: None,
        active_file_ext: None,
    }
}

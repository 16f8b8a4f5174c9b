//! `G_DELIVERABLES`: declared files must exist under the project.
//!
//! A deliverable may contain one `*` path segment. That segment is matched
//! against directory entries by prefix and suffix only; there is no general
//! glob support.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::json;
use std::fs;

use crate::types::{DeliverableCheck, GateId, GateResult};

/// Check every deliverable and build the gate result.
#[must_use]
pub fn check_deliverables(
    project: &Utf8Path,
    deliverables: &[String],
) -> (GateResult, Vec<DeliverableCheck>) {
    let checks: Vec<DeliverableCheck> = deliverables
        .iter()
        .map(|pattern| check_one(project, pattern))
        .collect();

    let missing: Vec<&str> = checks
        .iter()
        .filter(|c| !c.exists)
        .map(|c| c.path.as_str())
        .collect();

    let gate = if deliverables.is_empty() {
        GateResult::new(GateId::Deliverables, true, "No deliverables declared")
    } else if missing.is_empty() {
        GateResult::new(
            GateId::Deliverables,
            true,
            format!("All {} deliverables present", checks.len()),
        )
    } else {
        GateResult::new(
            GateId::Deliverables,
            false,
            format!("{} of {} deliverables missing", missing.len(), checks.len()),
        )
        .with_details(json!({ "missing": missing }))
    };

    (gate, checks)
}

fn check_one(project: &Utf8Path, pattern: &str) -> DeliverableCheck {
    let pattern_trimmed = pattern.trim_start_matches("./");
    if !pattern_trimmed.contains('*') {
        return DeliverableCheck {
            path: pattern.to_string(),
            exists: project.join(pattern_trimmed).exists(),
            matched: Vec::new(),
        };
    }

    let matched = expand_star(project, pattern_trimmed);
    DeliverableCheck {
        path: pattern.to_string(),
        exists: !matched.is_empty(),
        matched,
    }
}

/// Expand the first `*` segment of `pattern` into existing relative paths.
fn expand_star(project: &Utf8Path, pattern: &str) -> Vec<String> {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let Some(star_idx) = segments.iter().position(|s| s.contains('*')) else {
        return Vec::new();
    };

    let parent: Utf8PathBuf = segments[..star_idx].iter().collect();
    let star = segments[star_idx];
    let rest: Utf8PathBuf = segments[star_idx + 1..].iter().collect();

    let (prefix, suffix) = match (star.find('*'), star.rfind('*')) {
        (Some(first), Some(last)) => (&star[..first], &star[last + 1..]),
        _ => return Vec::new(),
    };

    let Ok(entries) = fs::read_dir(project.join(&parent)) else {
        return Vec::new();
    };

    let mut matched: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        })
        .map(|name| {
            let candidate = parent.join(name);
            if rest.as_str().is_empty() {
                candidate
            } else {
                candidate.join(&rest)
            }
        })
        .filter(|candidate| project.join(candidate).exists())
        .map(|candidate| candidate.into_string())
        .collect();

    matched.sort();
    matched
}

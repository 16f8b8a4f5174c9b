use std::collections::BTreeSet;

use pipeforge_utils::canonicalization::blake3_hex;

use crate::model::BlockingIssue;

/// Hex characters kept from the BLAKE3 digest
pub const FINGERPRINT_LEN: usize = 16;

/// Order-independent digest of the `(check, category)` pairs in `issues`.
///
/// Duplicated pairs count once, so only the *set* of failing checks and their
/// categories determines the fingerprint.
#[must_use]
pub fn failure_fingerprint(issues: &[BlockingIssue]) -> String {
    let pairs: BTreeSet<String> = issues
        .iter()
        .map(|issue| format!("{}::{}", issue.check, issue.category()))
        .collect();

    let joined = pairs.into_iter().collect::<Vec<_>>().join("\n");
    let mut digest = blake3_hex(joined.as_bytes());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

//! Run id generation and validation
//!
//! A run id has the form `YYYYMMDD_HHMM_<slug>` where the slug is derived from
//! free text describing the run. Run ids become directory names, so anything
//! read back from the command line or `RUN_ID` is validated before use.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::error::RunError;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 30;

/// Slug used when the free text contains nothing usable
pub const FALLBACK_SLUG: &str = "run";

/// Turn free text into a run-id slug.
///
/// NFKC-normalizes, lowercases, turns whitespace and underscores into `-`,
/// strips everything outside `[a-z0-9-]`, collapses repeated dashes and
/// truncates to [`MAX_SLUG_LEN`] characters.
///
/// ```
/// use pipeforge_utils::run_id::slugify;
///
/// assert_eq!(slugify("Todo App (MVP)!"), "todo-app-mvp");
/// assert_eq!(slugify("!!!"), "run");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();

    let mut slug = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        let mapped = if c.is_whitespace() || c == '_' { '-' } else { c };
        if mapped.is_ascii_lowercase() || mapped.is_ascii_digit() {
            slug.push(mapped);
        } else if mapped == '-' && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let truncated: String = slug.trim_start_matches('-').chars().take(MAX_SLUG_LEN).collect();
    let trimmed = truncated.trim_end_matches('-');

    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generate a run id from a wall-clock instant and free text.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pipeforge_utils::run_id::generate_run_id;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 0).unwrap();
/// assert_eq!(generate_run_id(at, "Recipe sharing site"), "20260309_1405_recipe-sharing-site");
/// ```
#[must_use]
pub fn generate_run_id(at: DateTime<Utc>, text: &str) -> String {
    format!("{}_{}", at.format("%Y%m%d_%H%M"), slugify(text))
}

/// Validate a run id supplied by a caller.
///
/// Ids are not required to follow the generated format (runs may be created
/// externally) but must be safe as a single path component.
pub fn validate_run_id(run_id: &str) -> Result<(), RunError> {
    let invalid = |reason: &str| RunError::InvalidId {
        run_id: run_id.to_string(),
        reason: reason.to_string(),
    };

    if run_id.trim().is_empty() {
        return Err(invalid("run id is empty"));
    }
    if run_id.starts_with('.') {
        return Err(invalid("run id must not start with '.'"));
    }
    if !run_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Build a Todo App"), "build-a-todo-app");
        assert_eq!(slugify("  leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
        assert_eq!(slugify("ＦＵＬＬ width"), "full-width");
    }

    #[test]
    fn test_slugify_truncates_to_thirty() {
        let slug = slugify("a very long description of a project that keeps going");
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert_eq!(slug, "a-very-long-description-of-a-p");
    }

    #[test]
    fn test_generate_run_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 7, 44).unwrap();
        assert_eq!(generate_run_id(at, "Chat Bot"), "20261018_0907_chat-bot");
    }

    #[test]
    fn test_validate_run_id() {
        assert!(validate_run_id("20261018_0907_chat-bot").is_ok());
        assert!(validate_run_id("").is_err());
        assert!(validate_run_id("../escape").is_err());
        assert!(validate_run_id("a/b").is_err());
        assert!(validate_run_id(".hidden").is_err());
    }

    proptest! {
        #[test]
        fn prop_slug_shape(text in ".{0,80}") {
            let slug = slugify(&text);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().count() <= MAX_SLUG_LEN);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }

        #[test]
        fn prop_generated_ids_validate(text in ".{0,80}") {
            let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
            prop_assert!(validate_run_id(&generate_run_id(at, &text)).is_ok());
        }
    }
}

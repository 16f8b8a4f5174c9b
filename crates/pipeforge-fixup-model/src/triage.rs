//! Failure triage
//!
//! Error and output text are lowercased, concatenated and matched against an
//! ordered rule list. Fixable rules come first; the first match wins. When
//! nothing matches the failure is treated as fixable `unknown`.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{FailureCategory, Triage};

struct Rule {
    category: FailureCategory,
    fixable: bool,
    pattern: Regex,
    reason: &'static str,
    suggestion: &'static str,
}

impl Rule {
    fn new(
        category: FailureCategory,
        fixable: bool,
        pattern: &str,
        reason: &'static str,
        suggestion: &'static str,
    ) -> Self {
        Self {
            category,
            fixable,
            pattern: Regex::new(pattern).expect("triage pattern is valid"),
            reason,
            suggestion,
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use FailureCategory::*;
    vec![
        // Fixable tier
        Rule::new(
            ImplementationBug,
            true,
            r"typeerror|referenceerror|syntaxerror|cannot read propert(y|ies) of (undefined|null)|is not a function|is not defined|unexpected token|nullpointerexception|attributeerror|nameerror",
            "Runtime or syntax error in the implementation",
            "Fix the code at the location named in the error output",
        ),
        Rule::new(
            MissingDependency,
            true,
            r"cannot find module|module not found|modulenotfounderror|no module named|importerror|err_module_not_found|failed to resolve import|cannot resolve module|command not found|: not found",
            "A module or tool the project needs is not installed",
            "Install the missing dependency and add it to the manifest",
        ),
        Rule::new(
            ConfigIssue,
            true,
            r"enoent|econnrefused|eaddrinuse|address already in use|port \d+ (is )?(already )?in use|no such file or directory",
            "Environment or configuration problem",
            "Check file paths, ports and environment variables",
        ),
        Rule::new(
            DockerIssue,
            true,
            r"docker|container|dockerfile",
            "Container build or runtime problem",
            "Check the Dockerfile and compose configuration",
        ),
        Rule::new(
            TestMismatch,
            true,
            r"assertionerror|assertion failed|expected .* (to equal|to be|but got|received)|tests? failed|\d+ failing|\bfailed\b.*\btests?\b",
            "Tests disagree with the implementation",
            "Align the implementation (or the test) with the specified behaviour",
        ),
        // Not-fixable tier
        Rule::new(
            ScopeMismatch,
            false,
            r"out of scope|scope (mismatch|creep)|not (in|part of) (the )?(spec|mvp)|requirements? (conflict|changed)",
            "Failure points at a scope problem in the specification",
            "Revisit the specification or intake scope",
        ),
        Rule::new(
            SecurityBlocker,
            false,
            r"security|vulnerab|cve-\d+|secret (detected|leaked)|permission denied|eacces|unauthori[sz]ed|forbidden",
            "Security-sensitive failure",
            "Have a human review the security implications before changing anything",
        ),
        Rule::new(
            ArchitectureIssue,
            false,
            r"architecture|circular (dependency|import)|design (flaw|issue)|requires? (a )?(rewrite|redesign)",
            "Failure requires an architectural change",
            "Escalate for a design decision",
        ),
        Rule::new(
            ExternalDependency,
            false,
            r"deprecated|breaking change|no longer (supported|available)|api (has )?changed|rate limit|service unavailable",
            "An external API or package changed underneath the project",
            "Pin a compatible version or update the integration by hand",
        ),
    ]
});

/// Classify one failing check from its error and output text.
#[must_use]
pub fn triage(check: &str, error: &str, output: &str) -> Triage {
    let text = format!("{error}\n{output}").to_lowercase();

    if let Some(rule) = RULES.iter().find(|rule| rule.pattern.is_match(&text)) {
        tracing::debug!(check, category = %rule.category, fixable = rule.fixable, "triaged failure");
        return Triage::new(
            rule.fixable,
            rule.category,
            rule.reason,
            Some(rule.suggestion.to_string()),
        );
    }

    tracing::warn!(
        check,
        "triage matched no known failure pattern; defaulting to fixable unknown"
    );
    Triage::new(
        true,
        FailureCategory::Unknown,
        "No known failure pattern matched",
        None,
    )
}

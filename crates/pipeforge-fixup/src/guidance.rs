use pipeforge_fixup_model::FailureCategory;

/// Ordered remediation steps for a failure category.
#[must_use]
pub fn remediation_steps(category: FailureCategory) -> &'static [&'static str] {
    match category {
        FailureCategory::ImplementationBug => &[
            "Open the file and line named in the error output",
            "Fix the undefined value, wrong call or syntax error at that location",
            "Re-run the failing command locally before re-verifying",
        ],
        FailureCategory::MissingDependency => &[
            "Identify the missing module from the error output",
            "Add it to the project manifest (package.json or requirements.txt)",
            "Run the package manager's install command",
        ],
        FailureCategory::ConfigIssue => &[
            "Check that every file path referenced by the command exists",
            "Free the port or change the configured port",
            "Verify required environment variables are set",
        ],
        FailureCategory::DockerIssue => &[
            "Build the image locally and read the first failing step",
            "Check base image tags and COPY paths in the Dockerfile",
            "Check service names and ports in docker-compose.yml",
        ],
        FailureCategory::TestMismatch => &[
            "Compare the expected and actual values in the assertion",
            "Decide whether the implementation or the test disagrees with the spec",
            "Fix that side and keep the other unchanged",
        ],
        FailureCategory::MissingDeliverable => &[
            "Create the missing file at the path declared in the Definition of Done",
            "Make sure it is generated inside the project directory",
        ],
        FailureCategory::MustNotViolation => &[
            "Remove the forbidden dependency, service or variable",
            "Replace the feature with the approach allowed by the constraints",
            "Delete any code that still imports the removed package",
        ],
        FailureCategory::CommandFailed => &[
            "Run the command by hand in the project directory",
            "Make it terminate on its own (no watch or server mode)",
            "Raise command_timeout_secs if it legitimately needs longer",
        ],
        FailureCategory::ScopeMismatch => &[
            "The failure reflects the specification, not the code",
            "Update the intake or spec, then approve the change with `fix --approve-change`",
        ],
        FailureCategory::SecurityBlocker => &[
            "Have a human review the security finding",
            "Do not suppress the check to make verification pass",
        ],
        FailureCategory::ArchitectureIssue => &[
            "Escalate for a design decision",
            "Record the decision in the design phase before re-implementing",
        ],
        FailureCategory::ExternalDependency => &[
            "Pin a version of the external package or API that still works",
            "Or port the integration to the new API by hand",
        ],
        FailureCategory::Unknown => &[
            "Read the full command output in verification.log",
            "Fix the first error reported",
            "Re-verify to see whether the failure is classified more precisely",
        ],
    }
}

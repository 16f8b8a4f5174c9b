//! Definition of Done and intake parsing
//!
//! The Definition of Done (DoD) is a markdown document with a front-matter
//! block, a deliverables checklist and a fenced `bash` block of verification
//! commands. Parsing is line-oriented. Missing sections yield empty lists;
//! only a missing or malformed front-matter block is an error.

mod front_matter;
mod intake;
mod sections;

use camino::Utf8Path;
use pipeforge_utils::error::{DodError, PipeforgeError};

pub use front_matter::{DodMetadata, FrontMatterValue, parse_front_matter};
pub use intake::Intake;
pub use sections::{extract_deliverables, extract_verification_commands};

/// Everything the Verifier consumes from a DoD document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionOfDone {
    pub metadata: DodMetadata,
    pub deliverables: Vec<String>,
    pub commands: Vec<String>,
}

impl DefinitionOfDone {
    pub fn parse(text: &str) -> Result<Self, DodError> {
        Ok(Self {
            metadata: parse_front_matter(text)?,
            deliverables: extract_deliverables(text),
            commands: extract_verification_commands(text),
        })
    }

    /// Read and parse the DoD at `path`.
    pub fn load(path: &Utf8Path) -> Result<Self, PipeforgeError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DodError::NotFound {
                    path: path.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let dod = Self::parse(&text)?;
        tracing::debug!(
            path = %path,
            deliverables = dod.deliverables.len(),
            commands = dod.commands.len(),
            "parsed definition of done"
        );
        Ok(dod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    const DOD: &str = "---
project_kind: web_app
language: typescript
constraints:
  auth: none
  db: none
---

# Definition of Done

## Deliverables
- [ ] `package.json`
- [x] `src/index.ts`

## Verification
```bash
npm install
npm test
```
";

    #[test]
    fn test_parse_full_document() {
        let dod = DefinitionOfDone::parse(DOD).unwrap();
        assert_eq!(dod.metadata.project_kind(), Some("web_app"));
        assert!(dod.metadata.forbids("auth"));
        assert_eq!(dod.deliverables, vec!["package.json", "src/index.ts"]);
        assert_eq!(dod.commands, vec!["npm install", "npm test"]);
    }

    #[test]
    fn test_load_missing_file_is_dod_not_found() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("DEFINITION_OF_DONE.md")).unwrap();
        let err = DefinitionOfDone::load(&path).unwrap_err();
        assert!(matches!(err, PipeforgeError::Dod(DodError::NotFound { .. })));
    }

    #[test]
    fn test_parse_without_front_matter_fails() {
        let err = DefinitionOfDone::parse("# Just a heading\n").unwrap_err();
        assert_eq!(err, DodError::MissingFrontMatter);
    }
}

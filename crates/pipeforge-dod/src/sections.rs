use regex::Regex;
use std::sync::LazyLock;

/// `- [ ] \`path\`` or `- [x] \`path\`` checklist lines
static DELIVERABLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s+\[[ xX]\]\s+`([^`]+)`").expect("deliverable pattern is valid")
});

const SHELL_FENCES: [&str; 3] = ["bash", "sh", "shell"];

/// Deliverable paths from the checklist, in document order.
///
/// When the document has a heading mentioning "deliverable", only that
/// section is scanned; otherwise the whole document is. Lines inside fenced
/// code blocks are never deliverables.
#[must_use]
pub fn extract_deliverables(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let scope = section_lines(&lines, "deliverable").unwrap_or(&lines);

    let mut in_fence = false;
    let mut deliverables = Vec::new();
    for line in scope {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = DELIVERABLE_LINE.captures(line) {
            let path = caps[1].trim();
            if !path.is_empty() {
                deliverables.push(path.to_string());
            }
        }
    }
    deliverables
}

/// Commands from fenced `bash` blocks, in document order.
///
/// Blocks under a "verification" heading are preferred; when that section has
/// none, every shell block in the document is used. Blank lines and `#`
/// comments are dropped and trailing-backslash continuations are joined.
#[must_use]
pub fn extract_verification_commands(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();

    if let Some(section) = section_lines(&lines, "verification") {
        let commands = shell_block_commands(section);
        if !commands.is_empty() {
            return commands;
        }
    }
    shell_block_commands(&lines)
}

fn shell_block_commands(lines: &[&str]) -> Vec<String> {
    let mut commands = Vec::new();
    let mut fence: Option<bool> = None;
    let mut pending = String::new();

    for line in lines {
        let trimmed = line.trim();
        if let Some(info) = trimmed.strip_prefix("```") {
            fence = match fence {
                None => Some(SHELL_FENCES.contains(&info.trim().to_ascii_lowercase().as_str())),
                Some(_) => {
                    flush(&mut pending, &mut commands);
                    None
                }
            };
            continue;
        }

        if fence != Some(true) {
            continue;
        }
        if pending.is_empty() && (trimmed.is_empty() || trimmed.starts_with('#')) {
            continue;
        }

        if let Some(head) = trimmed.strip_suffix('\\') {
            pending.push_str(head.trim_end());
            pending.push(' ');
        } else {
            pending.push_str(trimmed);
            flush(&mut pending, &mut commands);
        }
    }
    flush(&mut pending, &mut commands);
    commands
}

fn flush(pending: &mut String, commands: &mut Vec<String>) {
    let command = pending.trim();
    if !command.is_empty() {
        commands.push(command.to_string());
    }
    pending.clear();
}

/// Lines of the first section whose heading contains `keyword`
/// (case-insensitive), up to the next heading of the same or higher level.
fn section_lines<'a, 'b>(lines: &'a [&'b str], keyword: &str) -> Option<&'a [&'b str]> {
    let mut in_fence = false;
    let mut start = None;

    for (idx, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let Some(level) = heading_level(line) else {
            continue;
        };

        match start {
            None => {
                if line.to_lowercase().contains(keyword) {
                    start = Some((idx + 1, level));
                }
            }
            Some((begin, section_level)) if level <= section_level => {
                return Some(&lines[begin..idx]);
            }
            Some(_) => {}
        }
    }

    start.map(|(begin, _)| &lines[begin..])
}

fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    (level > 0 && trimmed[level..].starts_with(' ')).then_some(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_deliverables_scoped_to_section() {
        let text = "# DoD\n\n## Deliverables\n- [ ] `a.txt`\n- [x] `dist/*.js`\n\n## Acceptance\n- [ ] `not-a-deliverable`\n";
        assert_eq!(extract_deliverables(text), vec!["a.txt", "dist/*.js"]);
    }

    #[test]
    fn test_deliverables_without_section_scan_whole_document() {
        let text = "- [ ] `one`\nprose\n  * [X] `two`\n- [ ] no backticks\n";
        assert_eq!(extract_deliverables(text), vec!["one", "two"]);
    }

    #[test]
    fn test_deliverables_ignore_fenced_examples() {
        let text = "## Deliverables\n```md\n- [ ] `example`\n```\n- [ ] `real`\n";
        assert_eq!(extract_deliverables(text), vec!["real"]);
    }

    #[test]
    fn test_missing_sections_yield_empty() {
        assert!(extract_deliverables("# Nothing here\n").is_empty());
        assert!(extract_verification_commands("# Nothing here\n").is_empty());
    }

    #[test]
    fn test_commands_prefer_verification_section() {
        let text = "## Setup\n```bash\nnpm ci\n```\n\n## Verification\n```bash\n# run tests\nnpm test\n\nnpm run build\n```\n";
        assert_eq!(
            extract_verification_commands(text),
            vec!["npm test", "npm run build"]
        );
    }

    #[test]
    fn test_commands_fall_back_to_all_shell_blocks() {
        let text = "```bash\nmake\n```\n```python\nprint(1)\n```\n```sh\nmake test\n```\n";
        assert_eq!(extract_verification_commands(text), vec!["make", "make test"]);
    }

    #[test]
    fn test_commands_join_continuations() {
        let text = "```bash\ndocker build \\\n  -t app .\n```\n";
        assert_eq!(extract_verification_commands(text), vec!["docker build -t app ."]);
    }

    #[test]
    fn test_nested_heading_stays_in_section() {
        let text = "## Deliverables\n### Backend\n- [ ] `api.ts`\n## Other\n- [ ] `x`\n";
        assert_eq!(extract_deliverables(text), vec!["api.ts"]);
    }

    proptest! {
        #[test]
        fn prop_deliverable_count_and_order_preserved(
            paths in prop::collection::vec("[a-z][a-z0-9_/.-]{0,20}", 0..20),
            checked in prop::collection::vec(any::<bool>(), 20),
        ) {
            let mut doc = String::from("---\nlanguage: go\n---\n\n## Deliverables\n");
            for (i, path) in paths.iter().enumerate() {
                let mark = if checked[i] { "x" } else { " " };
                doc.push_str(&format!("- [{mark}] `{path}`\n"));
            }
            doc.push_str("\n## Verification\n```bash\ngo test ./...\n```\n");

            prop_assert_eq!(extract_deliverables(&doc), paths);
        }
    }
}

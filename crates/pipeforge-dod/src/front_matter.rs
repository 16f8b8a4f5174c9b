use std::collections::BTreeMap;

use pipeforge_utils::error::DodError;

/// A front-matter value: scalar, list (inline or block) or nested map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterValue {
    Scalar(String),
    List(Vec<String>),
    Map(BTreeMap<String, FrontMatterValue>),
}

impl FrontMatterValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Parsed front matter of a DoD document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DodMetadata {
    pub fields: BTreeMap<String, FrontMatterValue>,
}

impl DodMetadata {
    /// Look up a value by dotted path, e.g. `constraints.auth`.
    #[must_use]
    pub fn get(&self, dotted: &str) -> Option<&FrontMatterValue> {
        let mut parts = dotted.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            match current {
                FrontMatterValue::Map(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    #[must_use]
    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(FrontMatterValue::as_str)
    }

    #[must_use]
    pub fn project_kind(&self) -> Option<&str> {
        self.get_str("project_kind")
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.get_str("language")
    }

    /// Value of `constraints.<name>`.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&str> {
        self.get_str(&format!("constraints.{name}"))
    }

    /// True when `constraints.<name>` declares the capability absent
    /// (`none`, `no` or `false`).
    #[must_use]
    pub fn forbids(&self, name: &str) -> bool {
        self.constraint(name).is_some_and(|v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "none" | "no" | "false")
        })
    }
}

struct Line<'a> {
    no: usize,
    indent: usize,
    text: &'a str,
}

/// Parse the `---` delimited front-matter block at the top of `text`.
///
/// Supports `key: value`, two-space nested maps, inline `[a, b]` lists and
/// block lists of `- item` lines under a bare `key:`. Blank lines, `#`
/// comment lines and trailing ` # comments` are ignored.
pub fn parse_front_matter(text: &str) -> Result<DodMetadata, DodError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut raw_lines = text.lines().enumerate().skip_while(|(_, l)| l.trim().is_empty());

    match raw_lines.next() {
        Some((_, first)) if first.trim_end() == "---" => {}
        _ => return Err(DodError::MissingFrontMatter),
    }

    let mut lines = Vec::new();
    let mut closed = false;
    for (idx, raw) in raw_lines {
        if raw.trim_end() == "---" {
            closed = true;
            break;
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(Line {
            no: idx + 1,
            indent: raw.len() - raw.trim_start_matches(' ').len(),
            text: trimmed,
        });
    }
    if !closed {
        return Err(DodError::UnterminatedFrontMatter);
    }

    let mut pos = 0;
    let base_indent = lines.first().map_or(0, |l| l.indent);
    let fields = parse_map(&lines, &mut pos, base_indent)?;
    if let Some(line) = lines.get(pos) {
        return Err(malformed(line));
    }

    Ok(DodMetadata { fields })
}

fn parse_map(
    lines: &[Line<'_>],
    pos: &mut usize,
    indent: usize,
) -> Result<BTreeMap<String, FrontMatterValue>, DodError> {
    let mut map = BTreeMap::new();

    while let Some(line) = lines.get(*pos) {
        if line.indent < indent {
            break;
        }
        if line.indent > indent || is_list_item(line.text) {
            return Err(malformed(line));
        }

        let (key, rest) = split_key(line)?;
        *pos += 1;

        let value = if rest.is_empty() {
            match lines.get(*pos) {
                Some(next) if is_list_item(next.text) && next.indent >= indent => {
                    FrontMatterValue::List(parse_block_list(lines, pos, next.indent))
                }
                Some(next) if next.indent > indent => {
                    FrontMatterValue::Map(parse_map(lines, pos, next.indent)?)
                }
                _ => FrontMatterValue::Scalar(String::new()),
            }
        } else {
            parse_inline(rest)
        };

        map.insert(key.to_string(), value);
    }

    Ok(map)
}

fn parse_block_list(lines: &[Line<'_>], pos: &mut usize, indent: usize) -> Vec<String> {
    let mut items = Vec::new();
    while let Some(line) = lines.get(*pos) {
        if line.indent != indent || !is_list_item(line.text) {
            break;
        }
        let item = strip_comment(line.text.trim_start_matches('-'));
        if !item.is_empty() {
            items.push(unquote(item).to_string());
        }
        *pos += 1;
    }
    items
}

fn parse_inline(rest: &str) -> FrontMatterValue {
    if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return FrontMatterValue::List(items);
    }
    FrontMatterValue::Scalar(unquote(rest).to_string())
}

fn split_key<'a>(line: &Line<'a>) -> Result<(&'a str, &'a str), DodError> {
    let (key, rest) = line.text.split_once(':').ok_or_else(|| malformed(line))?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(malformed(line));
    }
    Ok((key, strip_comment(rest)))
}

/// Drop a trailing `# comment`: a `#` at the start or after whitespace,
/// outside a leading quoted string.
fn strip_comment(value: &str) -> &str {
    let value = value.trim();
    let scan_from = match value.chars().next() {
        Some(q @ ('"' | '\'')) => value[1..].find(q).map_or(value.len(), |end| end + 2),
        _ => 0,
    };
    let mut prev_ws = scan_from == 0;
    for (idx, ch) in value[scan_from..].char_indices() {
        if ch == '#' && prev_ws {
            return value[..scan_from + idx].trim_end();
        }
        prev_ws = ch.is_whitespace();
    }
    value
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn malformed(line: &Line<'_>) -> DodError {
    DodError::MalformedLine {
        line_no: line.no,
        line: line.text.to_string(),
    }
}

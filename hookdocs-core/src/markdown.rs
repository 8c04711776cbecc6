//! Tolerant parsing of generated hook pages.
//!
//! Pages are expected to look roughly like:
//!
//! ```text
//! ---
//! id: gravityview_before
//! sidebar_label: gravityview_before
//! ---
//!
//! # Action: gravityview/before
//!
//! Description paragraph.
//!
//! ## Parameters
//!
//! | Name | Type | Description |
//! | --- | --- | --- |
//! | $view_id | int | The View ID |
//!
//! ## Files
//!
//! - [includes/class-view.php:120](https://...)
//!
//! ## Since
//!
//! - 2.0
//! ```
//!
//! Every part is optional. Missing or malformed parts degrade to `None` or an
//! empty list; nothing in here returns an error.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::hook::{HookKind, HookParam, SourceLocation};

const FRONT_MATTER_DELIM: &str = "---";

/// Heading of the section this crate inserts.
pub const USAGE_EXAMPLE_HEADING: &str = "## Usage Example";

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^#\s+(Action|Filter)\s*:\s*(.+?)\s*$").expect("static regex is valid")
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?):(\d+)$").expect("static regex is valid"))
}

/// Splits YAML-ish front matter from the body.
///
/// Only flat `key: value` lines are understood; surrounding quotes are removed.
/// Text without a complete front-matter block is returned whole as the body.
pub fn split_front_matter(text: &str) -> (BTreeMap<String, String>, &str) {
    let mut fields = BTreeMap::new();
    let Some(rest) = text
        .strip_prefix(FRONT_MATTER_DELIM)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
    else {
        return (fields, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim();
        offset += line.len();
        if trimmed == FRONT_MATTER_DELIM {
            return (fields, &rest[offset..]);
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            let key = key.trim();
            if !key.is_empty() && !key.contains(' ') {
                fields.insert(key.to_string(), strip_quotes(value.trim()).to_string());
            }
        }
    }
    (BTreeMap::new(), text)
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Human-readable label from front matter: `sidebar_label`, then `title`.
pub fn front_matter_label(text: &str) -> Option<String> {
    let (fields, _) = split_front_matter(text);
    ["sidebar_label", "title"]
        .iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_empty())
        .cloned()
}

/// A `## ` section of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: &'a str,
    pub content: String,
}

/// Level-two sections in document order. Headings inside fenced blocks are ignored.
pub fn sections(body: &str) -> Vec<Section<'_>> {
    let mut out: Vec<Section<'_>> = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence {
            if let Some(title) = line.strip_prefix("## ") {
                out.push(Section {
                    title: title.trim(),
                    content: String::new(),
                });
                continue;
            }
        }
        if let Some(current) = out.last_mut() {
            current.content.push_str(line);
            current.content.push('\n');
        }
    }
    out
}

fn find_section<'s, 'a>(sections: &'s [Section<'a>], names: &[&str]) -> Option<&'s Section<'a>> {
    sections.iter().find(|s| {
        let lowered = s.title.to_lowercase();
        names.iter().any(|n| lowered == *n)
    })
}

/// The parsed pieces of a hook page, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHookPage {
    pub heading_kind: Option<HookKind>,
    pub heading_name: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<HookParam>,
    pub since: Option<String>,
    pub source: Option<SourceLocation>,
    pub example: Option<String>,
}

pub fn parse_hook_page(text: &str) -> ParsedHookPage {
    let (fields, body) = split_front_matter(text);
    let label = ["sidebar_label", "title"]
        .iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_empty())
        .cloned();

    let heading = heading_re().captures(body);
    let heading_kind = heading.as_ref().map(|c| match &c[1] {
        "Filter" => HookKind::Filter,
        _ => HookKind::Action,
    });
    let heading_name = heading
        .as_ref()
        .map(|c| c[2].trim_matches('`').trim().to_string())
        .filter(|n| !n.is_empty());

    let after_heading = match &heading {
        Some(c) => c.get(0).map_or(body, |m| &body[m.end()..]),
        None => body,
    };
    let description = first_paragraph(after_heading);

    let secs = sections(body);
    let parameters = find_section(&secs, &["parameters", "arguments"])
        .map(|s| parse_parameter_table(&s.content))
        .unwrap_or_default();
    let since = find_section(&secs, &["since"]).and_then(|s| first_list_value(&s.content));
    let source = find_section(&secs, &["files", "source", "location"])
        .and_then(|s| first_list_value(&s.content))
        .and_then(|v| parse_location(&v));
    let example = secs
        .iter()
        .find(|s| is_usage_title(s.title))
        .and_then(|s| first_code_block(&s.content));

    ParsedHookPage {
        heading_kind,
        heading_name,
        label,
        description,
        parameters,
        since,
        source,
        example,
    }
}

/// First paragraph of `text`, joined into one line. `None` if a heading comes first.
fn first_paragraph(text: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        if lines.is_empty() && trimmed.starts_with('#') {
            return None;
        }
        lines.push(trimmed);
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

/// Splits a table row on unescaped pipes.
fn table_cells(row: &str) -> Vec<String> {
    let inner = row.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Removes sigils, nesting markers and code ticks from a parameter name.
pub fn clean_param_name(raw: &str) -> String {
    raw.trim()
        .trim_matches('`')
        .trim_start_matches(['↳', '└', '├', '─', '-', '*', '>', ' '])
        .trim_start_matches(['&', '$'])
        .trim_matches('`')
        .trim()
        .to_string()
}

fn parse_parameter_table(content: &str) -> Vec<HookParam> {
    let rows: Vec<Vec<String>> = content
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('|'))
        .map(table_cells)
        .collect();
    let Some((header, rest)) = rows.split_first() else {
        return Vec::new();
    };

    let column = |names: &[&str], fallback: usize| {
        header
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
            .unwrap_or(fallback)
    };
    let name_col = column(&["name", "parameter", "argument"], 0);
    let type_col = column(&["type", "types"], 1);
    let desc_col = column(&["description", "desc"], 2);

    rest.iter()
        .filter(|cells| !is_separator_row(cells))
        .filter_map(|cells| {
            let name = clean_param_name(cells.get(name_col)?);
            if name.is_empty() {
                return None;
            }
            Some(HookParam {
                name,
                ty: cells
                    .get(type_col)
                    .map(|t| t.trim_matches('`').to_string())
                    .unwrap_or_default(),
                description: cells.get(desc_col).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// First non-empty line with list markers, link syntax and ticks removed.
fn first_list_value(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_start_matches(['-', '*', '+'])
        .trim()
        .trim_matches('`');
    let text = match (line.find('['), line.find("](")) {
        (Some(start), Some(end)) if start < end => &line[start + 1..end],
        _ => line,
    };
    let text = text.trim().trim_matches('`').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_location(value: &str) -> Option<SourceLocation> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match location_re().captures(value) {
        Some(c) => Some(SourceLocation {
            file: c[1].to_string(),
            line: c[2].parse().ok(),
        }),
        None => Some(SourceLocation {
            file: value.to_string(),
            line: None,
        }),
    }
}

fn is_usage_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    lowered.contains("usage") || lowered == "example" || lowered == "examples"
}

/// Contents of the first fenced code block, without the fences.
fn first_code_block(content: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.find(|l| l.trim_start().starts_with("```"))?;
    let mut code = Vec::new();
    for line in lines {
        if line.trim_start().starts_with("```") {
            return Some(code.join("\n"));
        }
        code.push(line);
    }
    None
}

/// True if the page already has a usage-example section.
pub fn has_usage_example(text: &str) -> bool {
    let (_, body) = split_front_matter(text);
    sections(body).iter().any(|s| is_usage_title(s.title))
}

fn usage_block(code: &str) -> String {
    format!("{USAGE_EXAMPLE_HEADING}\n\n```php\n{code}\n```\n")
}

/// Returns `text` with a usage-example section holding `code`.
///
/// The section goes immediately before a trailing `## Since` section, or at the
/// end of the page when there is none. Pages that already have a usage section
/// are returned unchanged.
pub fn insert_usage_example(text: &str, code: &str) -> String {
    if has_usage_example(text) {
        return text.to_string();
    }
    let block = usage_block(code);

    let mut offset = 0;
    let mut since_at = None;
    let mut in_fence = false;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence && trimmed.starts_with("## ") {
            since_at = trimmed[3..]
                .trim()
                .eq_ignore_ascii_case("since")
                .then_some(offset);
        }
        offset += line.len();
    }

    match since_at {
        Some(at) => format!("{}{block}\n{}", &text[..at], &text[at..]),
        None => {
            let mut out = text.trim_end_matches('\n').to_string();
            out.push_str("\n\n");
            out.push_str(&block);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_pipes_stay_inside_a_cell() {
        let cells = table_cells(r"| $value | string\|array | The value |");
        assert_eq!(cells, vec!["$value", "string|array", "The value"]);
    }

    #[test]
    fn param_names_lose_sigils_and_nesting_markers() {
        assert_eq!(clean_param_name("`$entry`"), "entry");
        assert_eq!(clean_param_name("↳ $args['id']"), "args['id']");
        assert_eq!(clean_param_name("&$query"), "query");
    }

    #[test]
    fn since_only_counts_when_it_is_the_last_section() {
        let text = "# Action: a\n\n## Since\n\n- 1.0\n\n## Files\n\n- a.php:1\n";
        let out = insert_usage_example(text, "x();");
        assert!(out.ends_with("```php\nx();\n```\n"));
    }
}

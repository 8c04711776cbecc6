//! Hook records and the rules that fill in what the markdown leaves out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two kinds of extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    Action,
    Filter,
}

impl HookKind {
    pub const ALL: [HookKind; 2] = [HookKind::Action, HookKind::Filter];

    /// Directory name holding this kind's pages (`actions` / `filters`).
    pub fn dir_name(self) -> &'static str {
        match self {
            HookKind::Action => "actions",
            HookKind::Filter => "filters",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "actions" => Some(HookKind::Action),
            "filters" => Some(HookKind::Filter),
            _ => None,
        }
    }

    pub fn plural_label(self) -> &'static str {
        match self {
            HookKind::Action => "Actions",
            HookKind::Filter => "Filters",
        }
    }

    /// Single-letter code used by the compact JSON projection.
    pub fn code(self) -> &'static str {
        match self {
            HookKind::Action => "a",
            HookKind::Filter => "f",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HookKind::Action => "action",
            HookKind::Filter => "filter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// One extracted hook. `name` is the real registered hook string; `id` is only
/// the page slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRecord {
    pub id: String,
    pub name: String,
    pub kind: HookKind,
    pub product: String,
    pub description: String,
    pub parameters: Vec<HookParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub related: Vec<String>,
}

/// Below this many characters an extracted description is replaced.
pub const MIN_DESCRIPTION_LEN: usize = 20;

/// Upper bound on related hooks per record.
pub const MAX_RELATED: usize = 5;

/// Keyword → category tag. A name containing any keyword gets the tag.
const CATEGORY_KEYWORDS: &[(&[&str], &str)] = &[
    (&["entry", "entries"], "entries"),
    (&["view"], "views"),
    (&["field"], "fields"),
    (&["search", "filter_by", "sort"], "search"),
    (&["widget"], "widgets"),
    (&["template", "layout"], "templates"),
    (&["edit"], "editing"),
    (&["approv"], "approval"),
    (&["export", "csv"], "export"),
    (&["import"], "import"),
    (&["permission", "capabilit", "can_"], "permissions"),
    (&["admin", "settings", "metabox"], "admin"),
    (&["render", "output", "html", "css", "script"], "rendering"),
    (&["query", "sql", "criteria"], "query"),
    (&["cache", "transient"], "cache"),
    (&["ajax", "rest_", "rest/", "_api", "api_", "/api"], "api"),
    (&["email", "notification", "notify"], "notifications"),
    (&["license", "update"], "licensing"),
];

pub const GENERAL_CATEGORY: &str = "general";

/// Category tags for a hook name; `["general"]` when nothing matches.
pub fn infer_categories(name: &str) -> Vec<String> {
    let lowered = name.to_lowercase();
    let mut tags: Vec<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, tag)| (*tag).to_string())
        .collect();
    if tags.is_empty() {
        tags.push(GENERAL_CATEGORY.to_string());
    }
    tags
}

/// True when `text` is unusable as a description.
pub fn description_needs_synthesis(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() < MIN_DESCRIPTION_LEN
        || trimmed.starts_with('|')
        || trimmed.starts_with("```")
        || trimmed.starts_with('#')
        || trimmed.starts_with("- ")
}

/// Templated description from name, kind and first parameter.
pub fn synthesize_description(name: &str, kind: HookKind, params: &[HookParam]) -> String {
    let lowered = name.to_lowercase();
    let subject = humanize_name(name);
    let timing = if lowered.contains("before") || lowered.contains("pre_") {
        Some("before")
    } else if lowered.contains("after") || lowered.contains("post_") {
        Some("after")
    } else {
        None
    };

    let mut text = match (kind, timing) {
        (HookKind::Action, Some(when)) => {
            let what = strip_timing_words(&subject);
            format!("Fires {when} {what}.")
        }
        (HookKind::Action, None) => format!("Fires during {subject}."),
        (HookKind::Filter, Some(when)) => {
            let what = strip_timing_words(&subject);
            format!("Filters the value used {when} {what}.")
        }
        (HookKind::Filter, None) => format!("Filters {subject}."),
    };

    if let Some(first) = params.first() {
        match kind {
            HookKind::Filter => text.push_str(&format!(
                " Return a modified `{}` to change the result.",
                first.name
            )),
            HookKind::Action => text.push_str(&format!(" Receives `{}`.", first.name)),
        }
    }
    text
}

fn humanize_name(name: &str) -> String {
    name.split(|c: char| c == '/' || c == '_' || c == '-' || c == '.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_timing_words(subject: &str) -> String {
    let kept: Vec<&str> = subject
        .split_whitespace()
        .filter(|w| !matches!(w.to_lowercase().as_str(), "before" | "after" | "pre" | "post"))
        .collect();
    if kept.is_empty() {
        subject.to_string()
    } else {
        kept.join(" ")
    }
}

/// Usage snippet for a hook that has none.
pub fn synthesize_example(name: &str, kind: HookKind, params: &[HookParam]) -> String {
    let arg_list = params
        .iter()
        .map(|p| format!("${}", p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let accepted = params.len().max(1);
    match kind {
        HookKind::Action => {
            let signature = if arg_list.is_empty() {
                "()".to_string()
            } else {
                format!("( {arg_list} )")
            };
            format!(
                "add_action( '{name}', function{signature} {{\n    // Your code here.\n}}, 10, {accepted} );"
            )
        }
        HookKind::Filter => {
            let returned = params
                .first()
                .map(|p| format!("${}", p.name))
                .unwrap_or_else(|| "$value".to_string());
            let arg_list = if arg_list.is_empty() {
                "$value".to_string()
            } else {
                arg_list
            };
            format!(
                "add_filter( '{name}', function( {arg_list} ) {{\n    // Modify and return the value.\n    return {returned};\n}}, 10, {accepted} );"
            )
        }
    }
}

const TIMING_SUFFIXES: &[&str] = &[
    "/before", "/after", "_before", "_after", "-before", "-after", "/pre", "/post", "_pre",
    "_post",
];

/// Name with a trailing before/after-style suffix removed, if it had one.
fn pair_stem(name: &str) -> Option<&str> {
    TIMING_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// Prefix up to the last `/` segment; `None` for names without one.
fn sibling_prefix(name: &str) -> Option<&str> {
    name.rfind('/').map(|idx| &name[..idx]).filter(|p| !p.is_empty())
}

/// Fills `related` on every record, grouping by product.
///
/// Two names pair up when they match once a trailing before/after suffix is
/// stripped from either side, so `x/render` pairs with `x/render/before`.
/// Paired variants come first, then same-prefix siblings, each
/// group sorted by name, capped at [`MAX_RELATED`].
pub fn link_related(records: &mut [HookRecord]) {
    let mut by_product: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, r) in records.iter().enumerate() {
        by_product.entry(r.product.as_str()).or_default().push(idx);
    }

    let mut related_for: Vec<Vec<String>> = vec![Vec::new(); records.len()];
    for indices in by_product.values() {
        for &i in indices {
            let name = &records[i].name;
            let stem = pair_stem(name);
            let key = stem.unwrap_or(name);
            let prefix = sibling_prefix(name);

            let mut pairs: Vec<&str> = Vec::new();
            let mut siblings: Vec<&str> = Vec::new();
            for &j in indices {
                let other = &records[j].name;
                if i == j || other == name {
                    continue;
                }
                let other_stem = pair_stem(other);
                if (stem.is_some() || other_stem.is_some()) && other_stem.unwrap_or(other) == key {
                    pairs.push(other);
                } else if prefix.is_some() && sibling_prefix(other) == prefix {
                    siblings.push(other);
                }
            }
            pairs.sort_unstable();
            pairs.dedup();
            siblings.sort_unstable();
            siblings.dedup();

            related_for[i] = pairs
                .into_iter()
                .chain(siblings)
                .take(MAX_RELATED)
                .map(str::to_string)
                .collect();
        }
    }

    for (record, related) in records.iter_mut().zip(related_for) {
        record.related = related;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_fall_back_to_general() {
        assert_eq!(infer_categories("gravityview/foo"), vec!["views"]);
        assert_eq!(infer_categories("gk/misc/thing"), vec!["general"]);
        assert!(infer_categories("gravityview_entry_link").contains(&"entries".to_string()));
    }

    #[test]
    fn pair_stem_requires_a_suffix() {
        assert_eq!(pair_stem("gravityview/render/before"), Some("gravityview/render"));
        assert_eq!(pair_stem("gravityview_before"), Some("gravityview"));
        assert_eq!(pair_stem("gravityview"), None);
    }

    fn record(name: &str) -> HookRecord {
        HookRecord {
            id: name.replace('/', "-"),
            name: name.to_string(),
            kind: HookKind::Action,
            product: "gravityview".to_string(),
            description: String::new(),
            parameters: Vec::new(),
            since: None,
            source: None,
            example: None,
            categories: Vec::new(),
            related: Vec::new(),
        }
    }

    #[test]
    fn unsuffixed_hook_pairs_with_its_before_variant() {
        let mut records = vec![record("gravityview/render"), record("gravityview/render/before")];
        link_related(&mut records);
        assert_eq!(records[0].related, vec!["gravityview/render/before"]);
        assert_eq!(records[1].related, vec!["gravityview/render"]);
    }

    #[test]
    fn pairs_are_listed_before_siblings() {
        let mut records = vec![
            record("gravityview/render_after"),
            record("gravityview/render"),
            record("gravityview/loaded"),
        ];
        link_related(&mut records);
        assert_eq!(
            records[1].related,
            vec!["gravityview/render_after", "gravityview/loaded"]
        );
        assert_eq!(
            records[2].related,
            vec!["gravityview/render", "gravityview/render_after"]
        );
    }
}

//! Maps configured product ids to checkout directory names.
//!
//! Checkout directories are named after remote repositories, which drift from
//! product ids (`gravityview-datatables` vs `GravityView-DataTables`). An exact
//! match on the normalised slug always wins; otherwise candidates are scored by
//! how many hyphen-separated tokens of the id they contain.

use std::fs;
use std::path::Path;

/// Lower-cases and keeps only ASCII alphanumerics.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Token matches dominate; name length only separates equal token counts.
const TOKEN_WEIGHT: usize = 1000;

fn score(tokens: &[String], candidate: &str) -> (usize, usize) {
    let lowered = candidate.to_lowercase();
    let matches = tokens
        .iter()
        .filter(|token| lowered.contains(token.as_str()))
        .count();
    (matches, matches * TOKEN_WEIGHT + candidate.len())
}

/// Best candidate directory for `target_id`, or `None`.
///
/// `None` when there are no candidates, or when no candidate shares a single
/// token with the id. In the latter case the highest score would only reflect
/// name length, so no candidate is returned at all rather than the longest.
pub fn best_match<'a, S: AsRef<str>>(target_id: &str, candidates: &'a [S]) -> Option<&'a str> {
    let names: Vec<&'a str> = candidates.iter().map(|c| c.as_ref()).collect();
    let normalized_target = normalize(target_id);
    if let Some(exact) = names.iter().find(|c| normalize(c) == normalized_target) {
        return Some(*exact);
    }

    let tokens: Vec<String> = target_id
        .to_lowercase()
        .split('-')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    names
        .into_iter()
        .map(|c| (c, score(&tokens, c)))
        .filter(|(_, (matches, _))| *matches > 0)
        .max_by(|(a, (_, sa)), (b, (_, sb))| sa.cmp(sb).then_with(|| b.cmp(a)))
        .map(|(c, _)| c)
}

/// Names of the directories directly inside `root`, sorted. Hidden entries are skipped.
pub fn list_directories(root: &Path) -> std::io::Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            dirs.push(name);
        }
    }
    dirs.sort();
    Ok(dirs)
}

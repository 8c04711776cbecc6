//! Filesystem helpers for the generated documentation tree.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{HookdocsError, Result};
use crate::hook::HookKind;
use crate::markdown::front_matter_label;

/// Name of every generated listing page.
pub const INDEX_FILE: &str = "index.md";

/// Sidebar descriptor file read by the site generator.
pub const CATEGORY_DESCRIPTOR: &str = "_category_.json";

/// True for markdown files other than the listing page.
pub fn is_hook_page(path: &Path) -> bool {
    let is_markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("mdx"));
    let is_index = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(INDEX_FILE) || n.eq_ignore_ascii_case("index.mdx"));
    is_markdown && !is_index
}

/// Hook pages directly inside `dir`, sorted by path. Missing directories yield nothing.
pub fn hook_pages(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut pages: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_hook_page(p))
        .collect();
    pages.sort();
    pages
}

/// File stem used as the page slug.
pub fn page_slug(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `(label, slug)` for every hook page in `dir`, sorted by label.
///
/// The label comes from the page's front matter, falling back to the slug.
pub fn labelled_pages(dir: &Path) -> Vec<(String, String)> {
    let mut pages: Vec<(String, String)> = hook_pages(dir)
        .into_iter()
        .map(|path| {
            let slug = page_slug(&path);
            let label = fs::read_to_string(&path)
                .ok()
                .and_then(|text| front_matter_label(&text))
                .unwrap_or_else(|| slug.clone());
            (label, slug)
        })
        .collect();
    pages.sort_by(|(la, sa), (lb, sb)| {
        la.to_lowercase()
            .cmp(&lb.to_lowercase())
            .then_with(|| sa.cmp(sb))
    });
    pages
}

/// A hook-kind directory found in the docs tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDir {
    pub product: String,
    pub kind: HookKind,
    pub path: PathBuf,
}

/// Every `actions`/`filters` directory under `docs_dir`, in path order.
///
/// The product id is the name of the directory holding the kind directory,
/// not the first segment under `docs_dir`. For a product filed under
/// categories (`docs/views/extensions/maps/actions`) that is `maps`, where the
/// first segment would be the category `views`.
pub fn find_kind_dirs(docs_dir: &Path) -> Vec<KindDir> {
    WalkDir::new(docs_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let kind = HookKind::from_dir_name(&e.file_name().to_string_lossy())?;
            let product = e.path().parent()?.file_name()?.to_string_lossy().into_owned();
            Some(KindDir {
                product,
                kind,
                path: e.path().to_path_buf(),
            })
        })
        .collect()
}

/// Recursively copies `src` into `dest`, creating `dest`.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| HookdocsError::io(dest, e))?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            HookdocsError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| HookdocsError::io(entry.path(), std::io::Error::other(e.to_string())))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| HookdocsError::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| HookdocsError::io(&target, e))?;
        }
    }
    Ok(())
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| HookdocsError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| HookdocsError::io(path, e))
}

#[derive(Debug, Serialize)]
struct CategoryDescriptor<'a> {
    label: &'a str,
    position: u32,
    collapsible: bool,
    collapsed: bool,
}

/// Writes the sidebar descriptor for the directory `dir`.
pub fn write_category_descriptor(dir: &Path, label: &str, position: u32) -> Result<()> {
    let descriptor = CategoryDescriptor {
        label,
        position,
        collapsible: true,
        collapsed: true,
    };
    let json = serde_json::to_string_pretty(&descriptor)?;
    write_file(&dir.join(CATEGORY_DESCRIPTOR), &format!("{json}\n"))
}

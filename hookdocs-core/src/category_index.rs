//! Standalone rewrite of the `actions/index.md` and `filters/index.md` pages.
//!
//! Unlike the regenerator's listings these pages only carry a count, so the
//! pass can run over any docs tree without the extractor or a checkout.

use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::enhance::product_identity;
use crate::error::Result;
use crate::hook::HookKind;
use crate::layout::{find_kind_dirs, hook_pages, write_file, INDEX_FILE};
use crate::template::{CategoryIndexContext, TemplateEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDir {
    pub product: String,
    pub kind: HookKind,
    pub path: PathBuf,
    pub count: usize,
}

pub fn kind_description(kind: HookKind, product_label: &str) -> String {
    match kind {
        HookKind::Action => format!(
            "Action hooks provided by {product_label}. Attach callbacks to run code at specific points."
        ),
        HookKind::Filter => format!(
            "Filter hooks provided by {product_label}. Attach callbacks to modify values before they are used."
        ),
    }
}

/// Rewrites the index page of every kind directory under `config.docs_dir`.
pub fn write_category_indexes(config: &Config) -> Result<Vec<IndexedDir>> {
    let engine = TemplateEngine::new()?;
    let mut indexed = Vec::new();

    for dir in find_kind_dirs(&config.docs_dir) {
        let count = hook_pages(&dir.path).len();
        let (label, _) = product_identity(&config.products, &dir.product);
        let kind_label = dir.kind.plural_label();
        let kind_lower = kind_label.to_lowercase();
        let page = engine.render_category_index(&CategoryIndexContext {
            product_label: &label,
            kind_label,
            kind_lower: &kind_lower,
            description: kind_description(dir.kind, &label),
            count,
        })?;
        write_file(&dir.path.join(INDEX_FILE), &page)?;
        info!(product = %dir.product, kind = %dir.kind, count, "[INDEX] Wrote category index");
        indexed.push(IndexedDir {
            product: dir.product,
            kind: dir.kind,
            path: dir.path,
            count,
        });
    }

    info!(directories = indexed.len(), "[INDEX] Category indexes written");
    Ok(indexed)
}

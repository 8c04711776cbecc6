//! Builds the JSON hook database from the generated pages and adds usage
//! examples to pages that lack one.
//!
//! Everything written to `json_dir` is a pure function of the markdown tree,
//! so running the pass twice yields byte-identical files. Only the context
//! file's statistics section carries a timestamp.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, Product};
use crate::error::{HookdocsError, Result};
use crate::hook::{
    description_needs_synthesis, infer_categories, link_related, synthesize_description,
    synthesize_example, HookKind, HookRecord,
};
use crate::layout::{find_kind_dirs, hook_pages, page_slug, write_file};
use crate::markdown::{has_usage_example, insert_usage_example, parse_hook_page};

pub const PRODUCTS_DIR: &str = "products";
pub const INDEX_JSON: &str = "index.json";
pub const FULL_JSON: &str = "hooks-full.json";
pub const COMPACT_JSON: &str = "hooks-compact.json";
pub const STATISTICS_HEADING: &str = "## Hook Statistics";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub actions: usize,
    pub filters: usize,
    pub total: usize,
}

impl KindCounts {
    fn of<'a>(hooks: impl IntoIterator<Item = &'a HookRecord>) -> Self {
        let mut counts = KindCounts::default();
        for hook in hooks {
            match hook.kind {
                HookKind::Action => counts.actions += 1,
                HookKind::Filter => counts.filters += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub counts: KindCounts,
}

#[derive(Debug, Serialize)]
struct ProductDocument<'a> {
    product: &'a ProductSummary,
    hooks: Vec<&'a HookRecord>,
}

#[derive(Debug, Serialize)]
struct IndexDocument<'a> {
    counts: KindCounts,
    products: &'a [ProductSummary],
}

#[derive(Debug, Serialize)]
struct FullDocument<'a> {
    counts: KindCounts,
    products: &'a [ProductSummary],
    hooks: &'a [HookRecord],
}

/// Single-letter projection of a [`HookRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactHook<'a> {
    pub i: &'a str,
    pub n: &'a str,
    pub k: &'static str,
    pub p: &'a str,
    pub d: &'a str,
    pub c: &'a [String],
}

impl<'a> From<&'a HookRecord> for CompactHook<'a> {
    fn from(hook: &'a HookRecord) -> Self {
        Self {
            i: &hook.id,
            n: &hook.name,
            k: hook.kind.code(),
            p: &hook.product,
            d: &hook.description,
            c: &hook.categories,
        }
    }
}

/// Consolidated model of every hook page under the docs tree.
#[derive(Debug, Default)]
pub struct HookDatabase {
    pub products: Vec<ProductSummary>,
    /// Sorted by product, kind, then id.
    pub hooks: Vec<HookRecord>,
}

impl HookDatabase {
    pub fn counts(&self) -> KindCounts {
        KindCounts::of(&self.hooks)
    }

    pub fn compact(&self) -> Vec<CompactHook<'_>> {
        self.hooks.iter().map(CompactHook::from).collect()
    }
}

#[derive(Debug, Default)]
pub struct EnhanceReport {
    pub products: usize,
    pub counts: KindCounts,
    pub examples_added: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl EnhanceReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Builds one record from a page's text. Never fails; gaps are synthesized.
pub fn build_record(product: &str, kind: HookKind, slug: &str, text: &str) -> HookRecord {
    let page = parse_hook_page(text);
    let name = page
        .heading_name
        .or(page.label)
        .unwrap_or_else(|| slug.to_string());
    let description = match page.description {
        Some(d) if !description_needs_synthesis(&d) => d,
        _ => synthesize_description(&name, kind, &page.parameters),
    };
    let example = page
        .example
        .unwrap_or_else(|| synthesize_example(&name, kind, &page.parameters));

    HookRecord {
        id: slug.to_string(),
        categories: infer_categories(&name),
        name,
        kind,
        product: product.to_string(),
        description,
        parameters: page.parameters,
        since: page.since,
        source: page.source,
        example: Some(example),
        related: Vec::new(),
    }
}

fn humanize_id(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Label and repo for a product id, from configuration when it is known.
pub fn product_identity(products: &[Product], id: &str) -> (String, Option<String>) {
    match products.iter().find(|p| p.id == id) {
        Some(p) => (p.display_label().to_string(), Some(p.repo.clone())),
        None => (humanize_id(id), None),
    }
}

/// Reads every hook page, returning the database plus the pages to enrich.
fn scan(
    docs_dir: &Path,
    products: &[Product],
    report: &mut EnhanceReport,
) -> (HookDatabase, Vec<(PathBuf, String, String)>) {
    let mut hooks = Vec::new();
    let mut pending = Vec::new();
    let mut seen: BTreeSet<(String, HookKind, String)> = BTreeSet::new();

    for dir in find_kind_dirs(docs_dir) {
        debug!(product = %dir.product, kind = %dir.kind, path = %dir.path.display(), "[ENHANCE] Scanning");
        for page in hook_pages(&dir.path) {
            let text = match fs::read_to_string(&page) {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %page.display(), error = %e, "[ENHANCE] Unreadable page skipped");
                    report.failures.push((page, e.to_string()));
                    continue;
                }
            };
            let mut slug = page_slug(&page);
            let base = slug.clone();
            let mut n = 2;
            while !seen.insert((dir.product.clone(), dir.kind, slug.clone())) {
                slug = format!("{base}-{n}");
                n += 1;
            }
            let record = build_record(&dir.product, dir.kind, &slug, &text);
            if !has_usage_example(&text) {
                if let Some(example) = &record.example {
                    pending.push((page, text, example.clone()));
                }
            }
            hooks.push(record);
        }
    }

    hooks.sort_by(|a, b| {
        (&a.product, a.kind, &a.id).cmp(&(&b.product, b.kind, &b.id))
    });
    link_related(&mut hooks);

    let mut by_product: BTreeMap<&str, Vec<&HookRecord>> = BTreeMap::new();
    for hook in &hooks {
        by_product.entry(hook.product.as_str()).or_default().push(hook);
    }
    let summaries = by_product
        .into_iter()
        .map(|(id, records)| {
            let (label, repo) = product_identity(products, id);
            ProductSummary {
                id: id.to_string(),
                label,
                repo,
                counts: KindCounts::of(records),
            }
        })
        .collect();

    (
        HookDatabase {
            products: summaries,
            hooks,
        },
        pending,
    )
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

/// Writes the JSON projections of `db` into `json_dir`, replacing old ones.
pub fn write_json(db: &HookDatabase, json_dir: &Path) -> Result<Vec<PathBuf>> {
    let products_dir = json_dir.join(PRODUCTS_DIR);
    if products_dir.exists() {
        fs::remove_dir_all(&products_dir).map_err(|e| HookdocsError::io(&products_dir, e))?;
    }
    let mut written = Vec::new();

    for product in &db.products {
        let document = ProductDocument {
            product,
            hooks: db.hooks.iter().filter(|h| h.product == product.id).collect(),
        };
        let path = products_dir.join(format!("{}.json", product.id));
        write_file(&path, &pretty(&document)?)?;
        written.push(path);
    }

    let counts = db.counts();
    let outputs = [
        (
            INDEX_JSON,
            pretty(&IndexDocument {
                counts,
                products: &db.products,
            })?,
        ),
        (
            FULL_JSON,
            pretty(&FullDocument {
                counts,
                products: &db.products,
                hooks: &db.hooks,
            })?,
        ),
        (
            COMPACT_JSON,
            format!("{}\n", serde_json::to_string(&db.compact())?),
        ),
    ];
    for (name, contents) in outputs {
        let path = json_dir.join(name);
        write_file(&path, &contents)?;
        written.push(path);
    }
    Ok(written)
}

/// The statistics block written into the context file.
pub fn statistics_section(db: &HookDatabase, generated_at: DateTime<Utc>) -> String {
    let counts = db.counts();
    let mut out = format!(
        "{STATISTICS_HEADING}\n\nGenerated: {}\n\n- Products: {}\n- Total hooks: {}\n- Actions: {}\n- Filters: {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        db.products.len(),
        counts.total,
        counts.actions,
        counts.filters,
    );
    if !db.products.is_empty() {
        out.push('\n');
        for p in &db.products {
            out.push_str(&format!(
                "- {}: {} actions, {} filters\n",
                p.label, p.counts.actions, p.counts.filters
            ));
        }
    }
    out
}

/// Replaces the statistics section of `existing`, or appends it.
///
/// The section runs from its heading to the next `## ` heading or the end.
pub fn replace_statistics_section(existing: &str, section: &str) -> String {
    let mut start = None;
    let mut end = existing.len();
    let mut offset = 0;
    for line in existing.split_inclusive('\n') {
        let trimmed = line.trim_end();
        match start {
            None if trimmed == STATISTICS_HEADING => start = Some(offset),
            Some(_) if trimmed.starts_with("## ") => {
                end = offset;
                break;
            }
            _ => {}
        }
        offset += line.len();
    }

    match start {
        Some(at) => {
            let rest = &existing[end..];
            if rest.is_empty() {
                format!("{}{section}", &existing[..at])
            } else {
                format!("{}{section}\n{rest}", &existing[..at])
            }
        }
        None if existing.trim().is_empty() => section.to_string(),
        None => format!("{}\n\n{section}", existing.trim_end_matches('\n')),
    }
}

fn update_context_file(path: &Path, db: &HookDatabase) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(HookdocsError::io(path, e)),
    };
    let section = statistics_section(db, Utc::now());
    write_file(path, &replace_statistics_section(&existing, &section))
}

/// Scans the docs tree of `config`, writes JSON and the context statistics,
/// then inserts usage examples into pages missing one.
pub fn enhance(config: &Config) -> Result<EnhanceReport> {
    let mut report = EnhanceReport::default();
    info!(docs_dir = %config.docs_dir.display(), "[ENHANCE] Building hook database");

    let (db, pending) = scan(&config.docs_dir, &config.products, &mut report);
    report.products = db.products.len();
    report.counts = db.counts();

    report.written = write_json(&db, &config.json_dir)?;
    update_context_file(&config.context_file, &db)?;
    report.written.push(config.context_file.clone());

    for (path, text, example) in pending {
        let updated = insert_usage_example(&text, &example);
        match fs::write(&path, updated) {
            Ok(()) => report.examples_added += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "[ENHANCE] Could not add usage example");
                report.failures.push((path, e.to_string()));
            }
        }
    }

    info!(
        products = report.products,
        hooks = report.counts.total,
        examples_added = report.examples_added,
        failures = report.failures.len(),
        "[ENHANCE] Done"
    );
    Ok(report)
}

//! Per-product documentation regeneration.
//!
//! For each product the extraction tool runs in a fresh temporary directory
//! holding its generated configuration. On success the tool's `actions` and
//! `filters` directories replace the product's previous pages, and the landing
//! and listing pages are rendered from templates.
//!
//! Products are processed strictly one at a time. A product that fails is
//! reported and skipped, except when the extraction tool itself cannot be
//! found: nothing after that could succeed, so the run stops there.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{category_path, resolve_product, Config, Product};
use crate::contract::HookExtractor;
use crate::download::{checkout_path, is_checkout};
use crate::error::Result;
use crate::extractor::ExtractorConfig;
use crate::hook::HookKind;
use crate::layout::{copy_dir, labelled_pages, write_category_descriptor, write_file, INDEX_FILE};
use crate::matcher::{best_match, list_directories};
use crate::template::{HookLink, KindIndexContext, ProductIndexContext, TemplateEngine};

/// Directory the extractor is told to write into, inside its working directory.
const TOOL_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationAction {
    Generated,
    DryRun,
    Failed,
}

impl RegenerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RegenerationAction::Generated => "generated",
            RegenerationAction::DryRun => "dry-run",
            RegenerationAction::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RegenerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookCounts {
    pub actions: usize,
    pub filters: usize,
}

impl HookCounts {
    pub fn total(&self) -> usize {
        self.actions + self.filters
    }
}

#[derive(Debug, Clone)]
pub struct RegenerationResult {
    pub product_id: String,
    pub success: bool,
    pub action: RegenerationAction,
    pub reason: Option<String>,
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub counts: HookCounts,
    /// The failure rules out every later product too.
    pub fatal: bool,
}

impl RegenerationResult {
    fn failed(product_id: &str, output: &Path, input: Option<PathBuf>, reason: String) -> Self {
        Self {
            product_id: product_id.to_string(),
            success: false,
            action: RegenerationAction::Failed,
            reason: Some(reason),
            input,
            output: output.to_path_buf(),
            counts: HookCounts::default(),
            fatal: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RegenerationReport {
    pub results: Vec<RegenerationResult>,
    /// Set when a fatal failure stopped the run before every product was tried.
    pub aborted: bool,
}

impl RegenerationReport {
    pub fn has_failures(&self) -> bool {
        self.aborted || self.results.iter().any(|r| !r.success)
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> Vec<&RegenerationResult> {
        self.results.iter().filter(|r| !r.success).collect()
    }
}

/// Final location of a product's pages.
pub fn product_output_dir(config: &Config, product: &Product) -> PathBuf {
    category_path(product, &config.categories)
        .iter()
        .fold(config.docs_dir.clone(), |dir, segment| dir.join(segment))
}

/// Locates the checkout for `product`.
///
/// The synchroniser's own location (`<checkout_dir>/<repo name>`) is used when
/// present; otherwise the product id is fuzzy-matched against the directories
/// that do exist.
pub fn resolve_checkout(config: &Config, product: &Product) -> std::result::Result<PathBuf, String> {
    let direct = checkout_path(&config.checkout_dir, product);
    if direct.is_dir() {
        return Ok(direct);
    }
    let candidates = list_directories(&config.checkout_dir).map_err(|e| {
        format!(
            "cannot read checkout directory {}: {e}",
            config.checkout_dir.display()
        )
    })?;
    match best_match(&product.id, &candidates) {
        Some(dir) => {
            let path = config.checkout_dir.join(dir);
            info!(product = %product.id, matched = %dir, "[REGEN] Using fuzzy-matched checkout");
            if !is_checkout(&path) {
                warn!(path = %path.display(), "[REGEN] Matched directory has no .git metadata");
            }
            Ok(path)
        }
        None => Err(format!(
            "no local checkout for {} (expected {})",
            product.id,
            direct.display()
        )),
    }
}

/// Finds the tool's `actions`/`filters` directories under `tool_output`.
///
/// Looks in `tool_output/docs` first, then `tool_output` itself. Directory
/// names are compared case-insensitively.
pub fn locate_kind_dirs(tool_output: &Path) -> Option<BTreeMap<HookKind, PathBuf>> {
    for root in [tool_output.join("docs"), tool_output.to_path_buf()] {
        let Ok(entries) = fs::read_dir(&root) else {
            continue;
        };
        let found: BTreeMap<HookKind, PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                HookKind::from_dir_name(&name).map(|kind| (kind, e.path()))
            })
            .collect();
        if !found.is_empty() {
            return Some(found);
        }
    }
    None
}

/// Regenerates every product in `products`, in order.
pub async fn regenerate_all<E>(
    config: &Config,
    products: &[&Product],
    extractor: &E,
    dry_run: bool,
) -> Result<RegenerationReport>
where
    E: HookExtractor + ?Sized,
{
    let engine = TemplateEngine::with_overrides(&config.templates)?;
    let mut report = RegenerationReport::default();

    info!(
        products = products.len(),
        dry_run,
        "[REGEN] Starting documentation regeneration"
    );

    for (index, product) in products.iter().enumerate() {
        let result = regenerate_product(config, product, extractor, &engine, dry_run).await;
        let fatal = result.fatal;
        report.results.push(result);
        if fatal {
            let skipped = products.len() - index - 1;
            error!(
                product = %product.id,
                skipped,
                "[REGEN][ERROR] Extractor unavailable, skipping remaining products"
            );
            report.aborted = skipped > 0;
            break;
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed().len(),
        aborted = report.aborted,
        "[REGEN] Regeneration finished"
    );
    Ok(report)
}

pub async fn regenerate_product<E>(
    config: &Config,
    product: &Product,
    extractor: &E,
    engine: &TemplateEngine<'_>,
    dry_run: bool,
) -> RegenerationResult
where
    E: HookExtractor + ?Sized,
{
    let resolved = resolve_product(config, product);
    let output = product_output_dir(config, product);
    info!(product = %product.id, output = %output.display(), "[REGEN] Regenerating product");

    let checkout = match resolve_checkout(config, product) {
        Ok(path) => path,
        Err(reason) => {
            error!(product = %product.id, %reason, "[REGEN][ERROR] Missing checkout");
            return RegenerationResult::failed(&product.id, &output, None, reason);
        }
    };

    let input = match &resolved.source_dir {
        Some(sub) => checkout.join(sub),
        None => checkout,
    };
    if !input.is_dir() {
        let reason = format!("source directory {} does not exist", input.display());
        error!(product = %product.id, %reason, "[REGEN][ERROR] Missing source directory");
        return RegenerationResult::failed(&product.id, &output, Some(input), reason);
    }

    if dry_run {
        info!(
            product = %product.id,
            input = %input.display(),
            output = %output.display(),
            "[REGEN] Dry run, nothing written"
        );
        return RegenerationResult {
            product_id: product.id.clone(),
            success: true,
            action: RegenerationAction::DryRun,
            reason: None,
            input: Some(input),
            output,
            counts: HookCounts::default(),
            fatal: false,
        };
    }

    let fail = |reason: String| {
        error!(product = %product.id, %reason, "[REGEN][ERROR] Regeneration failed");
        RegenerationResult::failed(&product.id, &output, Some(input.clone()), reason)
    };

    let input_abs = match fs::canonicalize(&input) {
        Ok(p) => p,
        Err(e) => return fail(format!("cannot resolve {}: {e}", input.display())),
    };
    let workdir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => return fail(format!("cannot create temporary directory: {e}")),
    };
    let tool_output = workdir.path().join(TOOL_OUTPUT_DIR);
    let tool_config = ExtractorConfig::for_product(&resolved, &input_abs, &tool_output);
    if let Err(e) = tool_config.write(workdir.path(), &config.extractor.config_file) {
        return fail(e.to_string());
    }

    if let Err(e) = extractor.extract(workdir.path()).await {
        let mut result = fail(e.to_string());
        result.fatal = e.is_not_found();
        return result;
    }

    let Some(kind_dirs) = locate_kind_dirs(&tool_output) else {
        return fail(format!(
            "extractor produced no actions/filters directories under {}",
            tool_output.display()
        ));
    };

    if let Err(e) = relocate(&kind_dirs, &output) {
        return fail(e.to_string());
    }

    let counts = match write_indexes(engine, config, product, &resolved.branch, &resolved.tagline, &output) {
        Ok(counts) => counts,
        Err(e) => return fail(e.to_string()),
    };

    if let Err(e) = write_descriptors(config, product, &output) {
        return fail(e.to_string());
    }

    info!(
        product = %product.id,
        actions = counts.actions,
        filters = counts.filters,
        "[REGEN] Generated"
    );
    RegenerationResult {
        product_id: product.id.clone(),
        success: true,
        action: RegenerationAction::Generated,
        reason: None,
        input: Some(input.clone()),
        output: output.clone(),
        counts,
        fatal: false,
    }
}

/// Replaces `output` with the tool's kind directories, lower-casing their names.
fn relocate(kind_dirs: &BTreeMap<HookKind, PathBuf>, output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output).map_err(|e| crate::error::HookdocsError::io(output, e))?;
    }
    for kind in HookKind::ALL {
        let dest = output.join(kind.dir_name());
        match kind_dirs.get(&kind) {
            Some(src) => copy_dir(src, &dest)?,
            None => {
                fs::create_dir_all(&dest).map_err(|e| crate::error::HookdocsError::io(&dest, e))?
            }
        }
    }
    Ok(())
}

fn write_indexes(
    engine: &TemplateEngine<'_>,
    config: &Config,
    product: &Product,
    branch: &str,
    tagline: &str,
    output: &Path,
) -> Result<HookCounts> {
    let label = product.display_label();
    let mut counts = HookCounts::default();

    for kind in HookKind::ALL {
        let dir = output.join(kind.dir_name());
        let hooks: Vec<HookLink> = labelled_pages(&dir)
            .into_iter()
            .map(|(label, slug)| HookLink { label, slug })
            .collect();
        match kind {
            HookKind::Action => counts.actions = hooks.len(),
            HookKind::Filter => counts.filters = hooks.len(),
        }
        let kind_label = kind.plural_label();
        let kind_lower = kind_label.to_lowercase();
        let page = engine.render_kind_index(&KindIndexContext {
            product_id: &product.id,
            product_label: label,
            kind_label,
            kind_lower: &kind_lower,
            count: hooks.len(),
            hooks: &hooks,
        })?;
        write_file(&dir.join(INDEX_FILE), &page)?;
    }

    let page = engine.render_product_index(&ProductIndexContext {
        id: &product.id,
        label,
        tagline,
        repo: &product.repo,
        repo_url: format!("https://{}/{}", config.git_host, product.repo),
        branch,
        action_count: counts.actions,
        filter_count: counts.filters,
        total: counts.total(),
    })?;
    write_file(&output.join(INDEX_FILE), &page)?;
    Ok(counts)
}

/// Sidebar descriptors for the product directory and its category chain.
fn write_descriptors(config: &Config, product: &Product, output: &Path) -> Result<()> {
    let position = config
        .products
        .iter()
        .position(|p| p.id == product.id)
        .map_or(0, |i| i as u32 + 1);
    write_category_descriptor(output, product.display_label(), position)?;

    let mut dir = config.docs_dir.clone();
    let segments = category_path(product, &config.categories);
    for segment in &segments[..segments.len() - 1] {
        dir = dir.join(segment);
        if let Some(category) = config.categories.get(segment) {
            write_category_descriptor(&dir, &category.label, category.position)?;
        }
    }
    Ok(())
}

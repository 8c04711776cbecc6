//! Configuration data model: products, categories, extractor settings.
//!
//! The structs deserialize straight from the YAML file read by the CLI. Nothing
//! here mutates after loading; per-product settings are produced by
//! [`resolve_product`], which merges global defaults with product overrides into
//! a fresh [`ResolvedProduct`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: PathBuf,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_git_host")]
    pub git_host: String,
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default)]
    pub extractor: ExtractorSettings,
    #[serde(default)]
    pub ignore_files: Vec<String>,
    #[serde(default)]
    pub ignore_hooks: Vec<String>,
    /// Extra keys copied verbatim into every extractor configuration.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub templates: TemplateOverrides,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// One documented unit, backed by one remote repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    /// `owner/name` coordinate of the remote repository.
    pub repo: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Restricts extraction to a subdirectory of the checkout.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub ignore_files: Vec<String>,
    #[serde(default)]
    pub ignore_hooks: Vec<String>,
}

impl Product {
    /// Name of the repository itself; checkouts are keyed by this, not the product id.
    pub fn repo_name(&self) -> &str {
        self.repo.rsplit('/').next().unwrap_or(&self.repo)
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub label: String,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    #[serde(default = "default_extractor_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// File name the extractor expects its configuration under, in its working directory.
    #[serde(default = "default_extractor_config_file")]
    pub config_file: String,
    #[serde(default = "default_tagline")]
    pub tagline: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            command: default_extractor_command(),
            args: Vec::new(),
            config_file: default_extractor_config_file(),
            tagline: default_tagline(),
        }
    }
}

/// Handlebars sources replacing the built-in index templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateOverrides {
    #[serde(default)]
    pub product_index: Option<String>,
    #[serde(default)]
    pub kind_index: Option<String>,
}

fn default_checkout_dir() -> PathBuf {
    PathBuf::from("repos")
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_json_dir() -> PathBuf {
    PathBuf::from("static/hooks")
}
fn default_context_file() -> PathBuf {
    PathBuf::from("static/llms.txt")
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_git_host() -> String {
    "github.com".to_string()
}
fn default_parallel() -> usize {
    4
}
fn default_extractor_command() -> String {
    "wp-hooks-documentor".to_string()
}
fn default_extractor_config_file() -> String {
    "wp-hooks-doc.json".to_string()
}
fn default_tagline() -> String {
    "Actions and filters reference".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkout_dir: default_checkout_dir(),
            docs_dir: default_docs_dir(),
            json_dir: default_json_dir(),
            context_file: default_context_file(),
            default_branch: default_branch(),
            git_host: default_git_host(),
            parallel: default_parallel(),
            extractor: ExtractorSettings::default(),
            ignore_files: Vec::new(),
            ignore_hooks: Vec::new(),
            custom_fields: BTreeMap::new(),
            templates: TemplateOverrides::default(),
            categories: BTreeMap::new(),
            products: Vec::new(),
        }
    }
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            checkout_dir = %self.checkout_dir.display(),
            docs_dir = %self.docs_dir.display(),
            products_count = self.products.len(),
            categories_count = self.categories.len(),
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }

    /// Checks the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel == 0 {
            return Err(ConfigError::ZeroParallelism);
        }

        for (id, category) in &self.categories {
            if let Some(parent_id) = &category.parent {
                let parent =
                    self.categories
                        .get(parent_id)
                        .ok_or_else(|| ConfigError::UnknownParent {
                            category: id.clone(),
                            parent: parent_id.clone(),
                        })?;
                if parent.parent.is_some() {
                    return Err(ConfigError::NestingTooDeep {
                        category: id.clone(),
                        parent: parent_id.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for (idx, product) in self.products.iter().enumerate() {
            if product.id.trim().is_empty() {
                return Err(ConfigError::EmptyProductId(idx));
            }
            if !seen.insert(product.id.as_str()) {
                return Err(ConfigError::DuplicateProduct(product.id.clone()));
            }
            let mut parts = product.repo.split('/');
            let valid_repo = matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
            );
            if !valid_repo {
                return Err(ConfigError::InvalidRepo {
                    product: product.id.clone(),
                    repo: product.repo.clone(),
                });
            }
            if let Some(category) = &product.category {
                if !self.categories.contains_key(category) {
                    return Err(ConfigError::UnknownCategory {
                        product: product.id.clone(),
                        category: category.clone(),
                    });
                }
            }
        }

        self.check_output_dirs()
    }

    /// A product's output directory must not be a category directory or
    /// contain another product's output directory, since regeneration
    /// replaces it wholesale.
    fn check_output_dirs(&self) -> Result<(), ConfigError> {
        let category_dirs: Vec<(&str, Vec<String>)> = self
            .categories
            .iter()
            .map(|(id, category)| {
                let mut dir: Vec<String> = category.parent.iter().cloned().collect();
                dir.push(id.clone());
                (id.as_str(), dir)
            })
            .collect();
        let outputs: Vec<(&str, Vec<String>)> = self
            .products
            .iter()
            .map(|p| (p.id.as_str(), category_path(p, &self.categories)))
            .collect();

        for (id, dir) in &outputs {
            if let Some((category, _)) = category_dirs.iter().find(|(_, c)| c == dir) {
                return Err(ConfigError::OutputCollision {
                    product: id.to_string(),
                    other: format!("category {category}"),
                });
            }
            if let Some((other, _)) = outputs
                .iter()
                .find(|(other, other_dir)| other != id && other_dir.starts_with(dir))
            {
                return Err(ConfigError::OutputCollision {
                    product: id.to_string(),
                    other: format!("product {other}"),
                });
            }
        }
        Ok(())
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products to operate on: all of them, or the single one named.
    pub fn select_products(&self, only: Option<&str>) -> Option<Vec<&Product>> {
        match only {
            Some(id) => self.find_product(id).map(|p| vec![p]),
            None => Some(self.products.iter().collect()),
        }
    }
}

/// Settings for one product after merging global defaults with its overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    pub id: String,
    pub label: String,
    pub repo: String,
    pub branch: String,
    pub tagline: String,
    pub source_dir: Option<PathBuf>,
    pub ignore_files: Vec<String>,
    pub ignore_hooks: Vec<String>,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Merges the global defaults in `config` with the overrides in `product`.
///
/// Neither input is modified. Ignore lists keep the global entries first, then
/// the product's additions, with duplicates dropped.
pub fn resolve_product(config: &Config, product: &Product) -> ResolvedProduct {
    ResolvedProduct {
        id: product.id.clone(),
        label: product.display_label().to_string(),
        repo: product.repo.clone(),
        branch: product
            .branch
            .clone()
            .unwrap_or_else(|| config.default_branch.clone()),
        tagline: product
            .tagline
            .clone()
            .unwrap_or_else(|| config.extractor.tagline.clone()),
        source_dir: product.source_dir.clone(),
        ignore_files: merge_unique(&config.ignore_files, &product.ignore_files),
        ignore_hooks: merge_unique(&config.ignore_hooks, &product.ignore_hooks),
        custom_fields: config.custom_fields.clone(),
    }
}

fn merge_unique(base: &[String], extra: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    base.iter()
        .chain(extra)
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}

/// Directory segments, relative to the docs root, under which a product's pages live.
///
/// `[parent, category, product]` for nested categories, `[category, product]` for
/// top-level ones, `[product]` when the product has no (known) category.
pub fn category_path(product: &Product, categories: &BTreeMap<String, Category>) -> Vec<String> {
    let mut segments = Vec::new();
    if let Some(category_id) = &product.category {
        if let Some(category) = categories.get(category_id) {
            if let Some(parent) = &category.parent {
                if categories.contains_key(parent) {
                    segments.push(parent.clone());
                }
            }
            segments.push(category_id.clone());
        }
    }
    segments.push(product.id.clone());
    segments
}

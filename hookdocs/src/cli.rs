/// # hookdocs CLI Interface (Module)
///
/// Command parsing and orchestration for the `hookdocs` binary. Every stage of
/// the pipeline lives in [`hookdocs-core`]; this module loads the YAML config,
/// wires the real `git` and extractor subprocesses into the core stages, prints
/// an itemised summary and turns any failed unit into an error so the process
/// exits non-zero.
///
/// ## How To Use
/// - From a shell: `hookdocs --config hookdocs.yaml <command>`, see `--help`.
/// - From tests: build a [`Cli`] and call [`run`].
///
/// [`hookdocs-core`]: ../../hookdocs-core/
use crate::load_config::load_config;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hookdocs_core::category_index::write_category_indexes;
use hookdocs_core::config::{Config, Product};
use hookdocs_core::download::{detect_auth_strategy, CheckoutSettings, GitCli};
use hookdocs_core::enhance::enhance;
use hookdocs_core::extractor::ExternalExtractor;
use hookdocs_core::regenerate::regenerate_all;
use hookdocs_core::status::{status, CheckoutState};
use hookdocs_core::synchronise::{synchronise, SynchroniseConfig};
use std::path::PathBuf;

/// CLI for hookdocs: aggregate hook documentation for a fleet of plugins.
#[derive(Parser, Debug)]
#[clap(
    name = "hookdocs",
    version,
    about = "Sync plugin repositories, regenerate their hook docs and publish JSON hook indexes"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true, default_value = "hookdocs.yaml")]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone or update the repository of every product
    Sync {
        /// Re-clone even when a checkout exists
        #[clap(long)]
        force: bool,
        /// Only this product id
        #[clap(long)]
        product: Option<String>,
        /// Repositories synchronised concurrently (overrides config)
        #[clap(long)]
        parallel: Option<usize>,
    },
    /// Run the extraction tool and rebuild each product's pages
    Regenerate {
        /// Only this product id
        #[clap(long)]
        product: Option<String>,
        /// Report input and output paths without writing anything
        #[clap(long)]
        dry_run: bool,
    },
    /// Build the JSON hook database and add missing usage examples
    Enhance,
    /// Rewrite the count pages of every actions/filters directory
    Index,
    /// Show checkout and page counts for each product
    Status {
        /// Only this product id
        #[clap(long)]
        product: Option<String>,
    },
}

fn select<'a>(config: &'a Config, product: Option<&str>) -> Result<Vec<&'a Product>> {
    match config.select_products(product) {
        Some(products) => Ok(products),
        None => bail!(
            "Unknown product '{}'; configured products: {}",
            product.unwrap_or_default(),
            config
                .products
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Sync {
            force,
            product,
            parallel,
        } => {
            let products = select(&config, product.as_deref())?;
            tracing::info!(command = "sync", products = products.len(), "Starting synchronisation");
            let settings = SynchroniseConfig {
                checkout: CheckoutSettings {
                    checkout_dir: config.checkout_dir.clone(),
                    default_branch: config.default_branch.clone(),
                    git_host: config.git_host.clone(),
                    auth: detect_auth_strategy().await,
                    force,
                },
                parallel: parallel.unwrap_or(config.parallel).max(1),
            };
            let report = synchronise(&settings, &GitCli::default(), &products).await?;

            println!("Synchronise summary");
            for outcome in &report.outcomes {
                match &outcome.error {
                    Some(reason) => println!("  {:<30} {:<14} {}", outcome.product_id, outcome.action, reason),
                    None => println!("  {:<30} {}", outcome.product_id, outcome.action),
                }
            }
            println!(
                "{} succeeded, {} failed",
                report.succeeded(),
                report.failed().len()
            );
            if report.has_failures() {
                bail!("{} repositories failed to synchronise", report.failed().len());
            }
            Ok(())
        }
        Commands::Regenerate { product, dry_run } => {
            let products = select(&config, product.as_deref())?;
            tracing::info!(command = "regenerate", products = products.len(), dry_run, "Starting regeneration");
            let extractor =
                ExternalExtractor::new(&config.extractor.command, config.extractor.args.clone());
            let report = regenerate_all(&config, &products, &extractor, dry_run).await?;

            println!("Regenerate summary");
            for result in &report.results {
                let input = result
                    .input
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                match &result.reason {
                    Some(reason) => println!("  {:<30} {:<10} {}", result.product_id, result.action, reason),
                    None => println!(
                        "  {:<30} {:<10} {} -> {} ({} actions, {} filters)",
                        result.product_id,
                        result.action,
                        input,
                        result.output.display(),
                        result.counts.actions,
                        result.counts.filters
                    ),
                }
            }
            let skipped = products.len() - report.results.len();
            println!(
                "{} succeeded, {} failed, {} skipped",
                report.succeeded(),
                report.failed().len(),
                skipped
            );
            if report.aborted {
                bail!(
                    "Extraction tool '{}' not found; {} products skipped",
                    extractor.program(),
                    skipped
                );
            }
            if report.has_failures() {
                bail!("{} products failed to regenerate", report.failed().len());
            }
            Ok(())
        }
        Commands::Enhance => {
            tracing::info!(command = "enhance", "Starting enhancement");
            let report = enhance(&config)?;

            println!("Enhance summary");
            println!(
                "  {} products, {} hooks ({} actions, {} filters)",
                report.products,
                report.counts.total,
                report.counts.actions,
                report.counts.filters
            );
            println!("  {} usage examples added", report.examples_added);
            for path in &report.written {
                println!("  wrote {}", path.display());
            }
            for (path, reason) in &report.failures {
                println!("  failed {}: {}", path.display(), reason);
            }
            if report.has_failures() {
                bail!("{} pages could not be processed", report.failures.len());
            }
            Ok(())
        }
        Commands::Index => {
            tracing::info!(command = "index", "Starting category index generation");
            let indexed = write_category_indexes(&config)?;

            println!("Index summary");
            for dir in &indexed {
                println!("  {} ({} {})", dir.path.display(), dir.count, dir.kind);
            }
            println!("{} index pages written", indexed.len());
            Ok(())
        }
        Commands::Status { product } => {
            let products = select(&config, product.as_deref())?;
            println!("Status");
            for s in status(&config, &products) {
                let checkout = match &s.checkout {
                    CheckoutState::Present(p) => p.display().to_string(),
                    CheckoutState::Matched(p) => format!("{} (matched)", p.display()),
                    CheckoutState::Missing => "missing".to_string(),
                };
                println!(
                    "  {:<30} branch={} checkout={} pages={}a/{}f",
                    s.id, s.branch, checkout, s.pages.actions, s.pages.filters
                );
            }
            Ok(())
        }
    }
}

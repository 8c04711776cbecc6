//! Batched repository synchronisation.
//!
//! Products are split into fixed-size batches. All syncs inside a batch run
//! concurrently; batches run one after the other. A failing product is recorded
//! in the report and never retried. Products sharing a repository share one
//! checkout, which is synchronised once on behalf of all of them. The only condition that stops the run is a
//! version-control client that cannot execute at all, which is checked once
//! before any product is touched.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Per-product work: [`crate::download::sync_product`]

use futures::future::join_all;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::Product;
use crate::contract::GitClient;
use crate::download::{checkout_path, sync_product, CheckoutSettings};
use crate::error::{HookdocsError, Result};

pub use crate::download::{SyncAction, SyncOutcome};

/// Inputs for one synchronisation run.
#[derive(Debug, Clone)]
pub struct SynchroniseConfig {
    pub checkout: CheckoutSettings,
    /// Batch size; values below 1 are treated as 1.
    pub parallel: usize,
}

/// Outcomes in product order.
#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub outcomes: Vec<SyncOutcome>,
}

impl SynchroniseReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.action.is_success()).count()
    }

    pub fn failed(&self) -> Vec<&SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.action.is_success())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| !o.action.is_success())
    }

    pub fn count(&self, action: SyncAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}

pub async fn synchronise<G>(
    config: &SynchroniseConfig,
    git: &G,
    products: &[&Product],
) -> Result<SynchroniseReport>
where
    G: GitClient + ?Sized,
{
    info!(
        products = products.len(),
        parallel = config.parallel,
        auth = config.checkout.auth.name(),
        force = config.checkout.force,
        "[SYNC] Starting repository synchronisation"
    );

    match git.version().await {
        Ok(version) => info!(%version, "[SYNC] git available"),
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] git is not usable, aborting");
            return Err(HookdocsError::GitMissing(e.to_string()));
        }
    }

    let (leaders, owner) = distinct_checkouts(&config.checkout.checkout_dir, products);
    let batch_size = config.parallel.max(1);
    let mut synced: Vec<SyncOutcome> = Vec::with_capacity(leaders.len());

    for (index, batch) in leaders.chunks(batch_size).enumerate() {
        info!(
            batch = index + 1,
            size = batch.len(),
            "[SYNC] Starting batch"
        );
        let outcomes = join_all(
            batch
                .iter()
                .map(|product| sync_product(git, &config.checkout, product)),
        )
        .await;
        synced.extend(outcomes);
    }

    let mut report = SynchroniseReport::default();
    for (product, &slot) in products.iter().zip(&owner) {
        let mut outcome = synced[slot].clone();
        if outcome.product_id != product.id {
            debug!(
                product = %product.id,
                shared_with = %outcome.product_id,
                "[SYNC] Sharing checkout"
            );
            outcome.product_id = product.id.clone();
            outcome.repo = product.repo.clone();
        }
        report.outcomes.push(outcome);
    }

    info!(
        cloned = report.count(SyncAction::Cloned),
        updated = report.count(SyncAction::Updated),
        failed = report.failed().len(),
        "[SYNC] Synchronisation finished"
    );
    Ok(report)
}

/// First product for each distinct checkout path, plus for every product the
/// index of the leader whose checkout it uses.
fn distinct_checkouts<'a>(
    checkout_dir: &Path,
    products: &[&'a Product],
) -> (Vec<&'a Product>, Vec<usize>) {
    let mut leaders: Vec<&'a Product> = Vec::new();
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    let owner = products
        .iter()
        .map(|product| {
            *seen
                .entry(checkout_path(checkout_dir, product))
                .or_insert_with(|| {
                    leaders.push(*product);
                    leaders.len() - 1
                })
        })
        .collect();
    (leaders, owner)
}

//! Read-only view of where each product stands on disk.

use std::path::PathBuf;

use crate::config::{resolve_product, Config, Product};
use crate::download::{checkout_path, is_checkout};
use crate::hook::HookKind;
use crate::layout::hook_pages;
use crate::regenerate::{product_output_dir, resolve_checkout, HookCounts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// `<checkout_dir>/<repo name>` holds a git checkout.
    Present(PathBuf),
    /// Only a fuzzy match on the product id found a directory.
    Matched(PathBuf),
    Missing,
}

#[derive(Debug, Clone)]
pub struct ProductStatus {
    pub id: String,
    pub branch: String,
    pub checkout: CheckoutState,
    pub output: PathBuf,
    pub pages: HookCounts,
}

pub fn product_status(config: &Config, product: &Product) -> ProductStatus {
    let resolved = resolve_product(config, product);
    let direct = checkout_path(&config.checkout_dir, product);
    let checkout = if is_checkout(&direct) {
        CheckoutState::Present(direct)
    } else {
        match resolve_checkout(config, product) {
            Ok(path) => CheckoutState::Matched(path),
            Err(_) => CheckoutState::Missing,
        }
    };
    let output = product_output_dir(config, product);
    let pages = HookCounts {
        actions: hook_pages(&output.join(HookKind::Action.dir_name())).len(),
        filters: hook_pages(&output.join(HookKind::Filter.dir_name())).len(),
    };
    ProductStatus {
        id: resolved.id,
        branch: resolved.branch,
        checkout,
        output,
        pages,
    }
}

pub fn status(config: &Config, products: &[&Product]) -> Vec<ProductStatus> {
    products.iter().map(|p| product_status(config, p)).collect()
}

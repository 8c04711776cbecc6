//! Index page templates.
//!
//! Built-in Handlebars templates live under `templates/` and are compiled into
//! the crate. The configuration may replace the product and kind index
//! templates with its own sources. Output is markdown, so HTML escaping is off.

use handlebars::Handlebars;
use serde::Serialize;

use crate::config::TemplateOverrides;
use crate::error::{HookdocsError, Result};

const PRODUCT_INDEX: &str = "product_index";
const KIND_INDEX: &str = "kind_index";
const CATEGORY_INDEX: &str = "category_index";

/// Context for the product landing page.
#[derive(Debug, Serialize)]
pub struct ProductIndexContext<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub tagline: &'a str,
    pub repo: &'a str,
    pub repo_url: String,
    pub branch: &'a str,
    pub action_count: usize,
    pub filter_count: usize,
    pub total: usize,
}

/// One entry in a kind listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HookLink {
    pub label: String,
    pub slug: String,
}

/// Context for the `actions/index.md` and `filters/index.md` listings.
#[derive(Debug, Serialize)]
pub struct KindIndexContext<'a> {
    pub product_id: &'a str,
    pub product_label: &'a str,
    pub kind_label: &'a str,
    pub kind_lower: &'a str,
    pub count: usize,
    pub hooks: &'a [HookLink],
}

/// Context for the count-only pages of the standalone index generator.
#[derive(Debug, Serialize)]
pub struct CategoryIndexContext<'a> {
    pub product_label: &'a str,
    pub kind_label: &'a str,
    pub kind_lower: &'a str,
    pub description: String,
    pub count: usize,
}

#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateEngine<'a> {
    /// Engine with the built-in templates only.
    pub fn new() -> Result<Self> {
        Self::with_overrides(&TemplateOverrides::default())
    }

    /// Engine whose product/kind templates come from `overrides` where given.
    pub fn with_overrides(overrides: &TemplateOverrides) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        let product = overrides
            .product_index
            .as_deref()
            .unwrap_or(include_str!("../templates/product_index.md.hbs"));
        let kind = overrides
            .kind_index
            .as_deref()
            .unwrap_or(include_str!("../templates/kind_index.md.hbs"));

        for (name, source) in [
            (PRODUCT_INDEX, product),
            (KIND_INDEX, kind),
            (
                CATEGORY_INDEX,
                include_str!("../templates/category_index.md.hbs"),
            ),
        ] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| {
                    HookdocsError::Template(format!("failed to register {name} template: {e}"))
                })?;
        }

        Ok(Self { handlebars })
    }

    pub fn render_product_index(&self, ctx: &ProductIndexContext<'_>) -> Result<String> {
        self.render(PRODUCT_INDEX, ctx)
    }

    pub fn render_kind_index(&self, ctx: &KindIndexContext<'_>) -> Result<String> {
        self.render(KIND_INDEX, ctx)
    }

    pub fn render_category_index(&self, ctx: &CategoryIndexContext<'_>) -> Result<String> {
        self.render(CATEGORY_INDEX, ctx)
    }

    fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<String> {
        self.handlebars
            .render(name, ctx)
            .map_err(|e| HookdocsError::Template(format!("{name} rendering failed: {e}")))
    }
}

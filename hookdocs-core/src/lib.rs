#![doc = "hookdocs-core: core pipelines for hookdocs."]

//! Repository synchronisation, per-product documentation regeneration, the
//! JSON hook database and the standalone category indexer all live here. The
//! `hookdocs` binary only loads configuration and prints summaries.
//!
//! # Usage
//! Subprocess seams (`git`, the extraction tool) are traits in [`contract`];
//! enable the `test-export-mocks` feature to get their `mockall` doubles.

pub mod category_index;
pub mod config;
pub mod contract;
pub mod download;
pub mod enhance;
pub mod error;
pub mod extractor;
pub mod hook;
pub mod layout;
pub mod markdown;
pub mod matcher;
pub mod regenerate;
pub mod status;
pub mod synchronise;
pub mod template;

pub use error::{CommandError, ConfigError, HookdocsError, Result};

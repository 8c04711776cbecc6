#![allow(unused)]

//! # contract: seams to the external commands
//!
//! The pipeline drives two opaque programs: the version-control client and the
//! hook extraction tool. Both are reached through the traits below so the
//! orchestration in [`crate::synchronise`] and [`crate::regenerate`] can be
//! exercised against mocks.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; the mocks are exported under the
//!   default `test-export-mocks` feature so integration tests can use them.
//!
//! ## Implementations
//! - [`crate::download::GitCli`] shells out to `git`.
//! - [`crate::extractor::ExternalExtractor`] runs the configured extraction command.

use async_trait::async_trait;
use std::path::Path;

use mockall::{automock, predicate::*};

use crate::error::CommandError;

/// Operations the synchroniser needs from the version-control client.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Returns the client's version string; fails if the client cannot run.
    async fn version(&self) -> Result<String, CommandError>;

    /// Shallow, single-branch clone of `url` at `branch` into `dest`.
    async fn clone_shallow(&self, url: &str, branch: &str, dest: &Path)
        -> Result<(), CommandError>;

    /// Fetches the tip of `branch` from `origin` into the checkout at `repo`.
    async fn fetch(&self, repo: &Path, branch: &str) -> Result<(), CommandError>;

    /// Hard-resets the checkout at `repo` to `target`, discarding local changes.
    async fn reset_hard(&self, repo: &Path, target: &str) -> Result<(), CommandError>;
}

/// The external hook extraction tool.
///
/// The tool reads its configuration file from `workdir` and writes its
/// markdown output wherever that configuration points.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HookExtractor: Send + Sync {
    async fn extract(&self, workdir: &Path) -> Result<(), CommandError>;
}

//! Error types shared by the pipeline stages.
//!
//! Per-product failures are reported through outcome records (see
//! [`crate::synchronise::SyncOutcome`] and [`crate::regenerate::RegenerationResult`]),
//! not through these types. The variants here are either configuration problems
//! detected before any work starts, subprocess failures that callers fold into
//! an outcome, or preconditions that abort the run.

use std::path::PathBuf;

/// Result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, HookdocsError>;

/// Top-level error for operations that cannot be isolated to a single product.
#[derive(thiserror::Error, Debug)]
pub enum HookdocsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The version-control client could not be executed at all.
    #[error("git is not available: {0}")]
    GitMissing(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(String),
}

impl HookdocsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HookdocsError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Problems found while validating a loaded configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("product at position {0} has an empty id")]
    EmptyProductId(usize),

    #[error("duplicate product id: {0}")]
    DuplicateProduct(String),

    #[error("product {product}: repo '{repo}' is not of the form owner/name")]
    InvalidRepo { product: String, repo: String },

    #[error("product {product} references unknown category '{category}'")]
    UnknownCategory { product: String, category: String },

    #[error("category {category} references unknown parent '{parent}'")]
    UnknownParent { category: String, parent: String },

    #[error("category {category} is nested more than one level deep (parent '{parent}' has its own parent)")]
    NestingTooDeep { category: String, parent: String },

    #[error("output directory of product {product} overlaps {other}")]
    OutputCollision { product: String, other: String },

    #[error("parallel must be at least 1")]
    ZeroParallelism,
}

/// Failure of an external command (git or the hook extractor).
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    /// The binary could not be found on the execution path.
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// Builds the error for a spawn failure, distinguishing a missing binary.
    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            CommandError::NotFound {
                program: program.to_string(),
            }
        } else {
            CommandError::Io {
                program: program.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CommandError::NotFound { .. })
    }

    /// Captured standard error, when the command ran and failed.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

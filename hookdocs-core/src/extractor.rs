//! The external hook extraction tool.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ResolvedProduct;
use crate::contract::HookExtractor;
use crate::error::{CommandError, HookdocsError, Result};

/// Configuration file handed to the extraction tool.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub title: String,
    pub tagline: String,
    pub ignore_files: Vec<String>,
    pub ignore_hooks: Vec<String>,
    pub skip_build: bool,
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl ExtractorConfig {
    pub fn for_product(product: &ResolvedProduct, input: &Path, output: &Path) -> Self {
        Self {
            kind: "plugin".to_string(),
            input_folder: input.to_path_buf(),
            output_folder: output.to_path_buf(),
            title: product.label.clone(),
            tagline: product.tagline.clone(),
            ignore_files: product.ignore_files.clone(),
            ignore_hooks: product.ignore_hooks.clone(),
            skip_build: true,
            custom_fields: product.custom_fields.clone(),
        }
    }

    /// Writes the configuration as pretty JSON to `workdir/file_name`.
    pub fn write(&self, workdir: &Path, file_name: &str) -> Result<PathBuf> {
        let path = workdir.join(file_name);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| HookdocsError::io(&path, e))?;
        debug!(path = %path.display(), "Wrote extractor configuration");
        Ok(path)
    }
}

/// Runs the configured command with the working directory set to the one
/// holding its configuration file.
#[derive(Debug, Clone)]
pub struct ExternalExtractor {
    program: String,
    args: Vec<String>,
}

impl ExternalExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl HookExtractor for ExternalExtractor {
    async fn extract(&self, workdir: &Path) -> std::result::Result<(), CommandError> {
        info!(program = %self.program, workdir = %workdir.display(), "[REGEN] Running extractor");
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .output()
            .await
            .map_err(|e| CommandError::from_spawn(&self.program, e))?;
        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            "[REGEN] Extractor output"
        );
        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

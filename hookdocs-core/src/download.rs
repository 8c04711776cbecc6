//! Local checkouts of product repositories.
//!
//! A checkout lives at `<checkout_dir>/<repo name>` and is recognised by its
//! `.git` directory. Creating one is a shallow single-branch clone; refreshing
//! one is a fetch followed by a hard reset to the fetched tip, so any local
//! edits in a checkout are discarded on every update.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::Product;
use crate::contract::GitClient;
use crate::error::CommandError;

/// How clone URLs are authenticated; chosen once per run.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Access token embedded into an HTTPS URL.
    Token(String),
    /// HTTPS URL, relying on an already authenticated `gh` session's credential helper.
    CliSession,
    /// SSH transport with the user's keys.
    Ssh,
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::Token(_) => f.write_str("Token(***)"),
            AuthStrategy::CliSession => f.write_str("CliSession"),
            AuthStrategy::Ssh => f.write_str("Ssh"),
        }
    }
}

impl AuthStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::Token(_) => "token",
            AuthStrategy::CliSession => "cli-session",
            AuthStrategy::Ssh => "ssh",
        }
    }

    /// Remote URL for `owner/name` on `host` under this strategy.
    pub fn clone_url(&self, host: &str, repo: &str) -> String {
        match self {
            AuthStrategy::Token(token) => {
                format!("https://x-access-token:{token}@{host}/{repo}.git")
            }
            AuthStrategy::CliSession => format!("https://{host}/{repo}.git"),
            AuthStrategy::Ssh => format!("git@{host}:{repo}.git"),
        }
    }
}

/// Picks the strategy in priority order: token, CLI session, SSH.
pub fn select_auth_strategy(token: Option<String>, cli_session: bool) -> AuthStrategy {
    match token {
        Some(t) if !t.trim().is_empty() => AuthStrategy::Token(t.trim().to_string()),
        _ if cli_session => AuthStrategy::CliSession,
        _ => AuthStrategy::Ssh,
    }
}

/// Reads `GITHUB_TOKEN`, then `GH_TOKEN`.
pub fn token_from_env() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|v| !v.trim().is_empty())
}

/// True when `gh auth status` succeeds.
pub async fn probe_cli_session() -> bool {
    match Command::new("gh").args(["auth", "status"]).output().await {
        Ok(out) => {
            debug!(status = ?out.status, "Probed gh auth status");
            out.status.success()
        }
        Err(e) => {
            debug!(error = ?e, "gh CLI not available");
            false
        }
    }
}

/// Detects the strategy from the environment and the `gh` CLI.
pub async fn detect_auth_strategy() -> AuthStrategy {
    let token = token_from_env();
    let cli_session = token.is_none() && probe_cli_session().await;
    let strategy = select_auth_strategy(token, cli_session);
    info!(strategy = strategy.name(), "Selected git authentication strategy");
    strategy
}

/// Replaces embedded credentials in any URL inside `text`.
pub fn redact_credentials(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("https://") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        let after_scheme = &tail["https://".len()..];
        let url_end = after_scheme
            .find(|c: char| c.is_whitespace() || c == '\'' || c == '"')
            .unwrap_or(after_scheme.len());
        let url = &after_scheme[..url_end];
        out.push_str("https://");
        match url.rfind('@') {
            Some(at) if !url[..at].contains('/') => {
                out.push_str("***");
                out.push_str(&url[at..]);
            }
            _ => out.push_str(url),
        }
        rest = &after_scheme[url_end..];
    }
    out.push_str(rest);
    out
}

/// `git` invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<Output, CommandError> {
        let output = cmd
            .output()
            .await
            .map_err(|e| CommandError::from_spawn(&self.program, e))?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(CommandError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: redact_credentials(String::from_utf8_lossy(&output.stderr).trim()),
            })
        }
    }
}

#[async_trait]
impl GitClient for GitCli {
    async fn version(&self) -> Result<String, CommandError> {
        let mut cmd = self.command();
        cmd.arg("--version");
        let out = self.run(cmd).await?;
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    async fn clone_shallow(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
    ) -> Result<(), CommandError> {
        let mut cmd = self.command();
        cmd.args(["clone", "--depth", "1", "--single-branch", "--branch", branch, url])
            .arg(dest);
        self.run(cmd).await.map(|_| ())
    }

    async fn fetch(&self, repo: &Path, branch: &str) -> Result<(), CommandError> {
        let mut cmd = self.command();
        cmd.arg("-C")
            .arg(repo)
            .args(["fetch", "--depth", "1", "origin", branch]);
        self.run(cmd).await.map(|_| ())
    }

    async fn reset_hard(&self, repo: &Path, target: &str) -> Result<(), CommandError> {
        let mut cmd = self.command();
        cmd.arg("-C").arg(repo).args(["reset", "--hard", target]);
        self.run(cmd).await.map(|_| ())
    }
}

/// What happened to one product's checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Updated,
    CloneFailed,
    UpdateFailed,
}

impl SyncAction {
    pub fn is_success(self) -> bool {
        matches!(self, SyncAction::Cloned | SyncAction::Updated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::Cloned => "cloned",
            SyncAction::Updated => "updated",
            SyncAction::CloneFailed => "clone_failed",
            SyncAction::UpdateFailed => "update_failed",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Everything [`sync_product`] needs besides the product itself.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub checkout_dir: PathBuf,
    pub default_branch: String,
    pub git_host: String,
    pub auth: AuthStrategy,
    pub force: bool,
}

/// Path of the checkout for `product` under `checkout_dir`.
pub fn checkout_path(checkout_dir: &Path, product: &Product) -> PathBuf {
    checkout_dir.join(product.repo_name())
}

/// True when `path` holds version-control metadata.
pub fn is_checkout(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Clone-or-update result for one product.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub product_id: String,
    pub repo: String,
    pub path: PathBuf,
    pub action: SyncAction,
    /// Captured stderr (or other reason) on failure.
    pub error: Option<String>,
}

/// Ensures an up-to-date checkout for `product`.
///
/// Clones when no checkout exists or `force` is set (removing whatever is at the
/// path first); otherwise fetches the branch and hard-resets to it.
pub async fn sync_product<G>(git: &G, settings: &CheckoutSettings, product: &Product) -> SyncOutcome
where
    G: GitClient + ?Sized,
{
    let path = checkout_path(&settings.checkout_dir, product);
    let branch = product
        .branch
        .as_deref()
        .unwrap_or(&settings.default_branch)
        .to_string();
    let outcome = |action, error| SyncOutcome {
        product_id: product.id.clone(),
        repo: product.repo.clone(),
        path: path.clone(),
        action,
        error,
    };

    if settings.force || !is_checkout(&path) {
        if path.exists() {
            if let Err(e) = fs::remove_dir_all(&path) {
                error!(error = ?e, path = %path.display(), "[SYNC] Failed to remove existing checkout");
                return outcome(
                    SyncAction::CloneFailed,
                    Some(format!("failed to remove {}: {e}", path.display())),
                );
            }
            debug!(path = %path.display(), "[SYNC] Removed existing checkout");
        }
        if let Err(e) = fs::create_dir_all(&settings.checkout_dir) {
            error!(error = ?e, path = %settings.checkout_dir.display(), "[SYNC] Failed to create checkout directory");
            return outcome(
                SyncAction::CloneFailed,
                Some(format!(
                    "failed to create {}: {e}",
                    settings.checkout_dir.display()
                )),
            );
        }

        let url = settings.auth.clone_url(&settings.git_host, &product.repo);
        info!(
            product = %product.id,
            url = %redact_credentials(&url),
            branch = %branch,
            "[SYNC] Cloning repository"
        );
        match git.clone_shallow(&url, &branch, &path).await {
            Ok(()) => {
                info!(product = %product.id, path = %path.display(), "[SYNC] Cloned");
                outcome(SyncAction::Cloned, None)
            }
            Err(e) => {
                error!(product = %product.id, error = %e, "[SYNC][ERROR] Clone failed");
                outcome(SyncAction::CloneFailed, Some(failure_text(&e)))
            }
        }
    } else {
        info!(product = %product.id, branch = %branch, path = %path.display(), "[SYNC] Updating checkout");
        if let Err(e) = git.fetch(&path, &branch).await {
            error!(product = %product.id, error = %e, "[SYNC][ERROR] Fetch failed");
            return outcome(SyncAction::UpdateFailed, Some(failure_text(&e)));
        }
        warn!(product = %product.id, "[SYNC] Hard-resetting checkout; local changes are discarded");
        match git.reset_hard(&path, "FETCH_HEAD").await {
            Ok(()) => {
                info!(product = %product.id, "[SYNC] Updated");
                outcome(SyncAction::Updated, None)
            }
            Err(e) => {
                error!(product = %product.id, error = %e, "[SYNC][ERROR] Reset failed");
                outcome(SyncAction::UpdateFailed, Some(failure_text(&e)))
            }
        }
    }
}

fn failure_text(e: &CommandError) -> String {
    let text = match e.stderr() {
        Some(stderr) if !stderr.is_empty() => stderr.to_string(),
        _ => e.to_string(),
    };
    redact_credentials(&text)
}

//! Version control of course repositories via the external git binary

use crate::error::ArchiveError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Versioning backend for course repositories
///
/// The archive writer drives this seam: initialize a repository lazily,
/// stage exactly the changed paths, commit with a deterministic summary.
/// Implementations must be safe to call from concurrent course workers as
/// long as each repository has at most one writer at a time.
#[async_trait]
pub trait Versioner: Send + Sync {
    /// Initialize a repository at `repo` (no-op if one already exists)
    async fn init(&self, repo: &Path) -> Result<(), ArchiveError>;

    /// Stage the given paths, relative to the repository root
    async fn stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<(), ArchiveError>;

    /// Record a commit with the given message
    async fn commit(&self, repo: &Path, message: &str) -> Result<(), ArchiveError>;
}

/// CLI-based versioner using the external git binary
///
/// Commits carry a fixed committer identity so repositories work in
/// environments with no global git configuration.
pub struct CliGit {
    binary_path: PathBuf,
}

impl CliGit {
    /// Create a versioner with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find git in PATH
    pub fn from_path() -> Option<Self> {
        which::which("git").ok().map(Self::new)
    }

    async fn run(&self, repo: &Path, args: &[&str]) -> Result<(), ArchiveError> {
        let output = Command::new(&self.binary_path)
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .await
            .map_err(|e| ArchiveError::Commit {
                repo: repo.to_path_buf(),
                reason: format!("failed to execute git: {e}"),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ArchiveError::Commit {
                repo: repo.to_path_buf(),
                reason: format!(
                    "git {} failed: {}",
                    args.first().unwrap_or(&""),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

#[async_trait]
impl Versioner for CliGit {
    async fn init(&self, repo: &Path) -> Result<(), ArchiveError> {
        if repo.join(".git").exists() {
            return Ok(());
        }
        tracing::info!(repo = %repo.display(), "initializing course repository");
        self.run(repo, &["init", "--quiet"]).await
    }

    async fn stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<(), ArchiveError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args: Vec<&str> = vec!["add", "--"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run(repo, &args).await
    }

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), ArchiveError> {
        self.run(
            repo,
            &[
                "-c",
                "user.name=gradevault",
                "-c",
                "user.email=gradevault@localhost",
                "commit",
                "--quiet",
                "-m",
                message,
            ],
        )
        .await
    }
}

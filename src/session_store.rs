//! Persisted session storage
//!
//! The session file is the only durable place an authenticated session
//! survives process exit. Saving is atomic (temp-then-rename) so a partially
//! written file is never observable, and loading fails soft: anything
//! missing, unreadable, or structurally invalid is treated as "absent",
//! which callers handle identically to "expired".

use crate::config::SessionConfig;
use crate::error::Result;
use crate::types::Session;
use crate::utils::write_json_atomic;
use std::path::{Path, PathBuf};

/// Stores and restores the authenticated session across runs
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store from configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.path)
    }

    /// Path of the persisted session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, if a valid one exists
    ///
    /// Never errors: a missing, unreadable, or corrupt file yields `None`,
    /// which triggers fresh authentication upstream.
    pub fn load(&self) -> Option<Session> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no persisted session");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read persisted session, treating as absent"
                );
                return None;
            }
        };

        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) => {
                tracing::debug!(user = %session.user, "restored persisted session");
                Some(session)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "persisted session is structurally invalid, treating as absent"
                );
                None
            }
        }
    }

    /// Persist a session atomically
    ///
    /// Parent directories are created as needed. The write goes to a sibling
    /// temp file first and is renamed into place.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        write_json_atomic(&self.path, session)?;
        tracing::info!(user = %session.user, path = %self.path.display(), "session persisted");
        Ok(())
    }

    /// Remove the persisted session
    ///
    /// Called when the remote rejects a restored session, before
    /// re-authenticating. A missing file is success.
    pub fn invalidate(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "persisted session invalidated");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

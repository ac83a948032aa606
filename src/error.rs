//! Error types for gradevault
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Auth, Crawl, Fetch, Archive)
//! - Reason taxonomies that drive the retry and re-authentication policy
//! - Context information (course id, file id, path) on every variant

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for gradevault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gradevault
///
/// This is the primary error type used throughout the library. Each variant
/// wraps a domain-specific error or a common infrastructure failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication failed (credentials, 2FA, or transport during login)
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Course or material listing failed
    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Content download failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Archive write or commit failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "platform.base_url")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Authentication errors
///
/// Produced by the authentication flow. `Transport` is the only transient
/// kind; `TwoFactorRejected` is deliberately never retried to avoid account
/// lockout from repeated code guesses.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The remote rejected the primary credentials
    #[error("credentials rejected for {user}")]
    CredentialsRejected {
        /// The username/email whose credentials were rejected
        user: String,
    },

    /// The interactive two-factor handler did not supply a code in time
    #[error("timed out waiting for two-factor code after {waited:?}")]
    TwoFactorTimeout {
        /// How long the flow waited before giving up
        waited: Duration,
    },

    /// The remote rejected the submitted two-factor code
    #[error("two-factor code rejected")]
    TwoFactorRejected,

    /// Network-level failure during the login sequence
    #[error("transport failure during authentication: {0}")]
    Transport(String),
}

/// Crawl errors (course and material listings)
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The session was rejected by the remote (401 or redirect-to-login)
    ///
    /// Propagates up to the orchestrator, which invalidates the session and
    /// performs exactly one re-authentication-and-retry cycle per run.
    #[error("session rejected by the remote")]
    Unauthorized,

    /// The listed resource does not exist
    #[error("{what} not found")]
    NotFound {
        /// Description of what was missing (e.g., "course c-42")
        what: String,
    },

    /// The remote representation could not be parsed
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// What was being parsed (e.g., "course listing page 2")
        what: String,
        /// Why parsing failed
        reason: String,
    },

    /// Network-level failure, including a pagination sequence that could not
    /// be fully drained (partial pages are an error, never silent truncation)
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Fetch errors (content downloads)
#[derive(Debug, Error)]
pub enum FetchError {
    /// The content no longer exists on the remote
    #[error("content {id} not found")]
    NotFound {
        /// Remote identifier of the missing file
        id: String,
    },

    /// The session may not read this content
    #[error("access to content {id} forbidden")]
    Forbidden {
        /// Remote identifier of the forbidden file
        id: String,
    },

    /// The remote throttled us and backoff attempts were exhausted
    #[error("rate limited fetching {id} after {attempts} attempts")]
    RateLimited {
        /// Remote identifier of the throttled file
        id: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Network-level failure after transport retries were exhausted
    #[error("transport failure fetching {id}: {reason}")]
    Transport {
        /// Remote identifier of the file
        id: String,
        /// Underlying failure description
        reason: String,
    },
}

/// Archive errors (local writes and version-control commits)
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Filesystem operation failed
    #[error("I/O failure at {path}: {source}")]
    Io {
        /// Path the operation was targeting
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The versioning tool failed to produce a commit
    ///
    /// Terminal for the course. The archive record on disk stays consistent
    /// with the bytes actually written, so a re-run commits the same delta.
    #[error("commit failed in {repo}: {reason}")]
    Commit {
        /// Repository the commit was attempted in
        repo: PathBuf,
        /// Tool output or failure description
        reason: String,
    },
}

impl FetchError {
    /// Remote identifier of the file this error refers to
    pub fn file_id(&self) -> &str {
        match self {
            FetchError::NotFound { id }
            | FetchError::Forbidden { id }
            | FetchError::RateLimited { id, .. }
            | FetchError::Transport { id, .. } => id,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Crawl(CrawlError::NotFound {
            what: "course c-42".to_string(),
        });
        assert_eq!(e.to_string(), "crawl error: course c-42 not found");

        let e = Error::Fetch(FetchError::RateLimited {
            id: "f-9".to_string(),
            attempts: 5,
        });
        assert!(e.to_string().contains("f-9"));
        assert!(e.to_string().contains("5 attempts"));
    }

    #[test]
    fn auth_error_never_exposes_a_password() {
        // AuthError variants carry the user, never the secret
        let e = AuthError::CredentialsRejected {
            user: "student@example.edu".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "credentials rejected for student@example.edu"
        );
    }

    #[test]
    fn fetch_error_exposes_file_id() {
        let cases = [
            FetchError::NotFound {
                id: "f-1".to_string(),
            },
            FetchError::Forbidden {
                id: "f-1".to_string(),
            },
            FetchError::RateLimited {
                id: "f-1".to_string(),
                attempts: 3,
            },
            FetchError::Transport {
                id: "f-1".to_string(),
                reason: "reset".to_string(),
            },
        ];
        for case in cases {
            assert_eq!(case.file_id(), "f-1");
        }
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}

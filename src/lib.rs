//! # gradevault
//!
//! Backend library for archiving course materials from an academic
//! submission platform into versioned local repositories.
//!
//! ## Design Philosophy
//!
//! gradevault is designed to be:
//! - **Idempotent** - Re-running against an unchanged remote fetches nothing
//!   and commits nothing
//! - **Incremental** - Only changed files are downloaded, each course gets at
//!   most one commit per run capturing exactly the delta
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Fault-isolating** - A failing file fails that file, a failing course
//!   fails that course, the run carries on and reports everything
//!
//! ## Quick Start
//!
//! ```no_run
//! use gradevault::{Config, Credentials, Orchestrator, StaticCodeHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.platform.base_url = "https://submit.example.edu".to_string();
//!
//!     let orchestrator = Orchestrator::new(config)?;
//!     let credentials = Credentials::new("student@example.edu", "password");
//!     let handler = StaticCodeHandler("123456".to_string());
//!
//!     let report = orchestrator.run(&credentials, &handler).await?;
//!     for outcome in &report.courses {
//!         println!("{}: {:?}", outcome.course.name, outcome.state);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive records and per-course repository writing
pub mod archive;
/// SSO + two-factor authentication flow
pub mod auth;
/// Configuration types
pub mod config;
/// Course and material hierarchy crawling
pub mod crawler;
/// Error types
pub mod error;
/// Content downloading with retry and rate-limit handling
pub mod fetcher;
/// Version control of course repositories
pub mod git;
/// Run orchestration
pub mod orchestrator;
/// Retry logic with backoff
pub mod retry;
/// Persisted session storage
pub mod session_store;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveRecord, ArchiveWriter, RECORD_FILE_NAME, RecordEntry};
pub use auth::{AuthenticationFlow, StaticCodeHandler, TwoFactorHandler};
pub use config::{
    ArchiveConfig, AuthConfig, BackoffStrategy, Config, CrawlConfig, FetchConfig, PlatformConfig,
    RetryConfig, SessionConfig,
};
pub use crawler::HierarchyCrawler;
pub use error::{ArchiveError, AuthError, CrawlError, Error, FetchError, Result};
pub use fetcher::{ContentFetcher, FetchedContent};
pub use git::{CliGit, Versioner};
pub use orchestrator::Orchestrator;
pub use session_store::SessionStore;
pub use types::{
    Assignment, ContentDigest, Course, CourseId, CourseOutcome, CourseState, Credentials, FileId,
    FileKind, Fingerprint, MaterialFile, MaterialTree, NodeFailure, NodeFailureKind, RunReport,
    RunState, Session,
};

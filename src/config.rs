//! Configuration types for gradevault
//!
//! All settings are serde-deserializable with sensible defaults so the crate
//! works with `Config::default()` plus a base URL. The excluded CLI/config
//! layer owns the on-disk format; these structs are the contract.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote platform settings (base URL, timeouts)
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Authentication settings (2FA wait)
    #[serde(default)]
    pub auth: AuthConfig,

    /// Persisted session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Crawl filtering settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Content fetch retry/backoff settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Local archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Remote platform settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the submission platform (default: "https://submit.example.edu")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Authentication settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Maximum time to wait for the interactive two-factor code (default: 120 seconds)
    ///
    /// The 2FA prompt is a human-in-the-loop suspension point; bounding it
    /// bounds the worst-case run time.
    #[serde(default = "default_two_factor_timeout", with = "duration_serde")]
    pub two_factor_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            two_factor_timeout: default_two_factor_timeout(),
        }
    }
}

/// Persisted session settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the authenticated session is persisted between runs
    /// (default: "./gradevault-session.json")
    ///
    /// Must live outside the archive root so it is never committed into a
    /// course repository.
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

/// Crawl filtering settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Courses whose display name contains any of these substrings are
    /// skipped entirely (default: empty)
    #[serde(default)]
    pub ignore_courses: Vec<String>,

    /// Only archive assignments the remote reports as graded (default: false)
    ///
    /// Assignments with no graded indication are kept either way.
    #[serde(default)]
    pub graded_only: bool,

    /// Skip a course whose archive was synced more recently than this
    /// (default: None = always sync)
    #[serde(default, with = "optional_duration_serde")]
    pub update_threshold: Option<Duration>,

    /// Maximum courses processed concurrently (default: 4)
    #[serde(default = "default_max_concurrent_courses")]
    pub max_concurrent_courses: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            ignore_courses: Vec::new(),
            graded_only: false,
            update_threshold: None,
            max_concurrent_courses: default_max_concurrent_courses(),
        }
    }
}

/// Content fetch retry/backoff settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Backoff policy for rate-limited (HTTP 429) responses
    #[serde(default = "default_rate_limit_retry")]
    pub rate_limit: RetryConfig,

    /// Backoff policy for transient transport failures
    #[serde(default = "default_transport_retry")]
    pub transport: RetryConfig,

    /// Politeness delay between successive content fetches within a course
    /// (default: None)
    #[serde(default, with = "optional_duration_serde")]
    pub request_delay: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit_retry(),
            transport: default_transport_retry(),
            request_delay: None,
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial try
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Backoff growth strategy
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        default_rate_limit_retry()
    }
}

/// How retry delays grow between attempts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Delay doubles each attempt, capped at `max_delay`
    #[default]
    Exponential,
    /// Delay grows by `initial_delay` each attempt, capped at `max_delay`
    Linear,
}

/// Local archive settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory holding one repository per course (default: "./archive")
    #[serde(default = "default_archive_root")]
    pub root: PathBuf,

    /// Explicit path to the git binary; discovered from PATH when unset
    #[serde(default)]
    pub git_binary: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
            git_binary: None,
        }
    }
}

fn default_base_url() -> String {
    "https://submit.example.edu".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("gradevault/{}", env!("CARGO_PKG_VERSION"))
}

fn default_two_factor_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_session_path() -> PathBuf {
    PathBuf::from("gradevault-session.json")
}

fn default_max_concurrent_courses() -> usize {
    4
}

fn default_rate_limit_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 5,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(60),
        strategy: BackoffStrategy::Exponential,
        jitter: true,
    }
}

fn default_transport_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(10),
        strategy: BackoffStrategy::Linear,
        jitter: false,
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

fn default_archive_root() -> PathBuf {
    PathBuf::from("archive")
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_values() {
        let config = Config::default();
        assert_eq!(config.platform.request_timeout, Duration::from_secs(30));
        assert_eq!(config.auth.two_factor_timeout, Duration::from_secs(120));
        assert_eq!(config.crawl.max_concurrent_courses, 4);
        assert!(!config.crawl.graded_only);
        assert!(config.crawl.update_threshold.is_none());
        assert_eq!(config.archive.root, PathBuf::from("archive"));
    }

    #[test]
    fn rate_limit_retry_matches_backoff_contract() {
        let retry = FetchConfig::default().rate_limit;
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_secs(1));
        assert_eq!(retry.max_delay, Duration::from_secs(60));
        assert_eq!(retry.strategy, BackoffStrategy::Exponential);
        assert!(retry.jitter);
    }

    #[test]
    fn transport_retry_is_linear_and_smaller() {
        let retry = FetchConfig::default().transport;
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.strategy, BackoffStrategy::Linear);
        assert!(!retry.jitter);
    }

    #[test]
    fn deserialize_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.session.path, PathBuf::from("gradevault-session.json"));
        assert!(config.crawl.ignore_courses.is_empty());
    }

    #[test]
    fn deserialize_partial_retry_config() {
        let json = r#"{"max_attempts": 2}"#;
        let retry: RetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.initial_delay, Duration::from_secs(1));
        assert_eq!(retry.strategy, BackoffStrategy::Exponential);
    }

    #[test]
    fn durations_round_trip_as_seconds() {
        let config = Config {
            crawl: CrawlConfig {
                update_threshold: Some(Duration::from_secs(86400)),
                ..CrawlConfig::default()
            },
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.crawl.update_threshold, Some(Duration::from_secs(86400)));
        assert_eq!(back.platform.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn backoff_strategy_uses_snake_case() {
        let s: BackoffStrategy = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(s, BackoffStrategy::Linear);
        assert_eq!(
            serde_json::to_string(&BackoffStrategy::Exponential).unwrap(),
            "\"exponential\""
        );
    }
}

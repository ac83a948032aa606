//! Core types for gradevault

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Login credentials supplied by the embedding application
///
/// The password is redacted from `Debug` output so credentials can appear in
/// tracing fields without leaking the secret.
#[derive(Clone)]
pub struct Credentials {
    /// Account email / username
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials from an email and password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session with the remote platform
///
/// Created by the authentication flow, persisted by the session store, and
/// consumed by the crawler and fetcher. Never ambient: every operation that
/// needs one takes it explicitly, so re-authentication is "swap the value and
/// retry the call".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token issued by the platform
    pub token: String,
    /// The identity this session authenticates
    pub user: String,
    /// When the session was established
    pub created_at: DateTime<Utc>,
    /// Remote-reported expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Liveness check: true when the session has passed its expiry
    ///
    /// A session with no reported expiry is treated as live until the remote
    /// rejects it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now >= expiry,
            None => false,
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Stable remote identifier of a course
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    /// Create a new CourseId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CourseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Stable remote identifier of a material file
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Create a new FileId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A course discovered on the platform
///
/// One course maps to exactly one local repository for its lifetime; the
/// directory name is derived deterministically from the display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Stable remote identifier
    pub id: CourseId,
    /// Full display name (e.g., "CS101 Introduction to Programming")
    pub name: String,
    /// Short name if the platform reports one (e.g., "CS101")
    pub short_name: Option<String>,
    /// Academic term if reported (e.g., "Fall 2025")
    pub term: Option<String>,
}

/// Kind of a material file within an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// A file the student submitted
    Submission,
    /// An instructor-provided attachment (handout, graded copy)
    Attachment,
}

/// Change-detection value for a remote file
///
/// Built from whatever the listing reports: a remote checksum when available,
/// otherwise a size+timestamp composite, otherwise just the file id (which
/// never matches a stored entry, so the file is always fetched).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Fingerprint from a remote-reported checksum
    pub fn from_checksum(checksum: &str) -> Self {
        Self(format!("sum:{checksum}"))
    }

    /// Fingerprint from size and last-modified time
    pub fn from_size_and_time(size: u64, updated_at: DateTime<Utc>) -> Self {
        Self(format!("meta:{size}:{}", updated_at.timestamp()))
    }

    /// Degenerate fingerprint for files with no change metadata at all
    ///
    /// Distinct from every stored value on the first run; on later runs it
    /// compares equal, so such files are fetched once and then skipped.
    pub fn opaque(id: &FileId) -> Self {
        Self(format!("id:{id}"))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 digest of fetched content, hex-encoded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(pub String);

impl ContentDigest {
    /// Compute the digest of a byte buffer
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A downloadable file belonging to an assignment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFile {
    /// Stable remote identifier
    pub id: FileId,
    /// Remote display name (used as the local filename, sanitized)
    pub name: String,
    /// Download URL (absolute, or a path resolved against the base URL)
    pub url: String,
    /// Submission or attachment
    pub kind: FileKind,
    /// Last-known change-detection value from the listing
    pub fingerprint: Fingerprint,
}

/// An assignment within a course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Stable remote identifier
    pub id: String,
    /// Display name (used as the local directory name, sanitized)
    pub name: String,
    /// Due date if the platform reports one
    pub due_at: Option<DateTime<Utc>>,
    /// Whether the assignment has been graded, if reported
    pub graded: Option<bool>,
    /// Files belonging to this assignment
    pub files: Vec<MaterialFile>,
}

/// The material hierarchy of one course (course → assignments → files)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTree {
    /// The course this tree belongs to
    pub course_id: CourseId,
    /// Assignments in deterministic traversal order
    pub assignments: Vec<Assignment>,
}

impl MaterialTree {
    /// Total number of files across all assignments
    pub fn file_count(&self) -> usize {
        self.assignments.iter().map(|a| a.files.len()).sum()
    }

    /// Sort assignments and files by remote identifier so repeated runs
    /// visit nodes identically
    pub fn sort(&mut self) {
        self.assignments.sort_by(|a, b| a.id.cmp(&b.id));
        for assignment in &mut self.assignments {
            assignment.files.sort_by(|a, b| a.id.cmp(&b.id));
        }
    }
}

/// Why a single node failed during sync
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFailureKind {
    /// Content missing on the remote
    NotFound,
    /// Access denied
    Forbidden,
    /// Rate-limit backoff exhausted
    RateLimited,
    /// Transport retries exhausted
    Transport,
    /// Local write failed
    Io,
}

/// A single node failure recorded in the run report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeFailure {
    /// Remote identifier of the failed file
    pub file_id: FileId,
    /// Failure classification
    pub kind: NodeFailureKind,
    /// Human-readable detail
    pub detail: String,
}

/// Final state of one course after a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseState {
    /// Every node synced (or was already current)
    Complete,
    /// Skipped because the archive was synced within the freshness threshold
    Fresh,
    /// Some nodes synced, some failed
    Partial,
    /// Listing, archiving, or committing failed for the whole course
    Failed,
}

impl CourseState {
    /// Whether this state counts as success for the overall run
    pub fn is_success(self) -> bool {
        matches!(self, CourseState::Complete | CourseState::Fresh)
    }
}

/// Outcome of syncing one course
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseOutcome {
    /// The course this outcome describes
    pub course: Course,
    /// Final state
    pub state: CourseState,
    /// Number of files fetched and written
    pub fetched: usize,
    /// Number of files skipped as unchanged
    pub skipped: usize,
    /// Per-node failures
    pub failures: Vec<NodeFailure>,
    /// Whether a commit was produced for this course
    pub committed: bool,
    /// Course-level failure description when `state` is `Failed`
    pub error: Option<String>,
}

impl CourseOutcome {
    /// Outcome for a course that failed before any node was processed
    pub fn failed(course: Course, error: impl Into<String>) -> Self {
        Self {
            course,
            state: CourseState::Failed,
            fetched: 0,
            skipped: 0,
            failures: Vec::new(),
            committed: false,
            error: Some(error.into()),
        }
    }

    /// Outcome for a course skipped by the freshness threshold
    pub fn fresh(course: Course) -> Self {
        Self {
            course,
            state: CourseState::Fresh,
            fetched: 0,
            skipped: 0,
            failures: Vec::new(),
            committed: false,
            error: None,
        }
    }
}

/// Overall state of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Every course succeeded
    Complete,
    /// At least one course failed or was only partially synced
    Partial,
    /// Every course failed
    Failed,
}

/// Aggregated result of one run, built by the orchestrator
///
/// Ephemeral: exists only for the duration of one run and is handed to the
/// embedding application as structured data. The core never prints it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-course outcomes, in listing order
    pub courses: Vec<CourseOutcome>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Overall run state: complete only if every course succeeded
    pub fn state(&self) -> RunState {
        let successes = self
            .courses
            .iter()
            .filter(|o| o.state.is_success())
            .count();
        if successes == self.courses.len() {
            RunState::Complete
        } else if successes == 0 && !self.courses.is_empty() {
            RunState::Failed
        } else {
            RunState::Partial
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn course(id: &str) -> Course {
        Course {
            id: CourseId::new(id),
            name: format!("Course {id}"),
            short_name: None,
            term: None,
        }
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("student@example.edu", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("student@example.edu"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn session_expiry_check() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut session = Session {
            token: "t".to_string(),
            user: "u".to_string(),
            created_at: now,
            expires_at: Some(now + chrono::Duration::hours(1)),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::hours(2)));

        session.expires_at = None;
        assert!(!session.is_expired(now + chrono::Duration::days(365)));
    }

    #[test]
    fn fingerprint_constructors_are_distinct() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let a = Fingerprint::from_checksum("abc");
        let b = Fingerprint::from_size_and_time(100, ts);
        let c = Fingerprint::opaque(&FileId::new("f-1"));
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn content_digest_is_deterministic_sha256() {
        let d1 = ContentDigest::of(b"hello");
        let d2 = ContentDigest::of(b"hello");
        assert_eq!(d1, d2);
        // Known SHA-256 of "hello"
        assert_eq!(
            d1.0,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn tree_sort_orders_assignments_and_files_by_id() {
        let file = |id: &str| MaterialFile {
            id: FileId::new(id),
            name: format!("{id}.pdf"),
            url: format!("/files/{id}"),
            kind: FileKind::Submission,
            fingerprint: Fingerprint::opaque(&FileId::new(id)),
        };
        let mut tree = MaterialTree {
            course_id: CourseId::new("c-1"),
            assignments: vec![
                Assignment {
                    id: "a-2".to_string(),
                    name: "A2".to_string(),
                    due_at: None,
                    graded: None,
                    files: vec![file("f-3"), file("f-1")],
                },
                Assignment {
                    id: "a-1".to_string(),
                    name: "A1".to_string(),
                    due_at: None,
                    graded: None,
                    files: vec![],
                },
            ],
        };
        tree.sort();
        assert_eq!(tree.assignments[0].id, "a-1");
        assert_eq!(tree.assignments[1].files[0].id.as_str(), "f-1");
        assert_eq!(tree.file_count(), 2);
    }

    #[test]
    fn run_state_aggregation() {
        let outcome = |state| CourseOutcome {
            course: course("c"),
            state,
            fetched: 0,
            skipped: 0,
            failures: Vec::new(),
            committed: false,
            error: None,
        };
        let now = Utc::now();
        let report = |states: Vec<CourseState>| RunReport {
            courses: states.into_iter().map(outcome).collect(),
            started_at: now,
            finished_at: now,
        };

        assert_eq!(
            report(vec![CourseState::Complete, CourseState::Fresh]).state(),
            RunState::Complete
        );
        assert_eq!(
            report(vec![CourseState::Complete, CourseState::Failed]).state(),
            RunState::Partial
        );
        assert_eq!(
            report(vec![CourseState::Failed, CourseState::Partial]).state(),
            RunState::Failed
        );
    }
}

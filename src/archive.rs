//! Idempotent archival onto versioned per-course repositories
//!
//! Maps a fetched material tree onto one local repository per course. The
//! [`ArchiveRecord`] at the repository root is the sole source of truth for
//! "already archived": a node whose listing fingerprint matches its record
//! entry is skipped without fetching. The record is rewritten atomically
//! after every successful node write, so an interrupted run leaves a valid,
//! partially-synced archive that the next run resumes by comparison.

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, FetchError};
use crate::fetcher::FetchedContent;
use crate::git::Versioner;
use crate::types::{
    ContentDigest, Course, CourseId, CourseOutcome, CourseState, Fingerprint, MaterialFile,
    MaterialTree, NodeFailure, NodeFailureKind,
};
use crate::utils::{sanitize_dir_name, sanitize_file_name, suffix_file_name, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the record file at every course repository root
pub const RECORD_FILE_NAME: &str = "archive-record.json";

/// One archived file: the fingerprint it had when last written, where it
/// went, and the digest of what was written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Listing fingerprint at the time of the last write
    pub fingerprint: Fingerprint,
    /// Local path, relative to the repository root; stable across runs
    pub path: PathBuf,
    /// SHA-256 of the written bytes
    pub sha256: ContentDigest,
    /// When the entry was last written
    pub archived_at: DateTime<Utc>,
}

/// Persisted per-course map from remote file identifier to archive state
///
/// Committed together with the content, so the archive is self-describing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// The course this record belongs to
    pub course_id: CourseId,
    /// Entries keyed by remote file identifier
    pub entries: BTreeMap<String, RecordEntry>,
    /// When the course last produced a successful delta sync
    pub synced_at: Option<DateTime<Utc>>,
}

impl ArchiveRecord {
    fn new(course_id: CourseId) -> Self {
        Self {
            course_id,
            entries: BTreeMap::new(),
            synced_at: None,
        }
    }

    /// Load the record from a repository root
    ///
    /// Missing or corrupt records start fresh: the worst outcome is a
    /// redundant re-download, never a corrupted archive.
    pub fn load(repo: &Path, course_id: &CourseId) -> Self {
        let path = repo.join(RECORD_FILE_NAME);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return Self::new(course_id.clone()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "archive record unreadable, starting fresh"
                );
                Self::new(course_id.clone())
            }
        }
    }

    fn save(&self, repo: &Path) -> Result<(), ArchiveError> {
        let path = repo.join(RECORD_FILE_NAME);
        write_json_atomic(&path, self).map_err(|source| ArchiveError::Io { path, source })
    }
}

/// Writes fetched content onto versioned per-course repositories
pub struct ArchiveWriter {
    root: PathBuf,
    versioner: Arc<dyn Versioner>,
}

impl ArchiveWriter {
    /// Create a writer rooted at the configured archive directory
    pub fn new(config: &ArchiveConfig, versioner: Arc<dyn Versioner>) -> Self {
        Self {
            root: config.root.clone(),
            versioner,
        }
    }

    /// Derive a stable local directory name per course
    ///
    /// Names come from the sanitized display name; courses whose sanitized
    /// names collide are each disambiguated with their id, deterministically.
    pub fn derive_dir_names(courses: &[Course]) -> BTreeMap<CourseId, String> {
        let mut by_name: BTreeMap<String, Vec<&Course>> = BTreeMap::new();
        for course in courses {
            let mut name = sanitize_dir_name(&course.name);
            if name.is_empty() {
                name = sanitize_file_name(course.id.as_str());
            }
            by_name.entry(name).or_default().push(course);
        }

        let mut out = BTreeMap::new();
        for (name, group) in by_name {
            if group.len() == 1 {
                out.insert(group[0].id.clone(), name);
            } else {
                for course in group {
                    let id = sanitize_file_name(course.id.as_str());
                    out.insert(course.id.clone(), format!("{name} {id}"));
                }
            }
        }
        out
    }

    /// When the course repository last recorded a successful delta sync
    ///
    /// Used for the freshness threshold before any listing traffic.
    pub fn last_synced(&self, course: &Course, dir_name: &str) -> Option<DateTime<Utc>> {
        let repo = self.root.join(dir_name);
        if !repo.join(RECORD_FILE_NAME).exists() {
            return None;
        }
        ArchiveRecord::load(&repo, &course.id).synced_at
    }

    /// Sync one course: fetch and write changed nodes, skip unchanged ones,
    /// and produce at most one commit capturing exactly the delta
    ///
    /// `fetch` is invoked only for nodes whose fingerprint is absent from or
    /// different in the archive record. The repository is initialized lazily
    /// on the first content write; a course with nothing to write touches
    /// nothing on disk.
    pub async fn sync<F, Fut>(
        &self,
        course: &Course,
        dir_name: &str,
        tree: &MaterialTree,
        fetch: F,
    ) -> Result<CourseOutcome, ArchiveError>
    where
        F: Fn(MaterialFile) -> Fut,
        Fut: Future<Output = Result<FetchedContent, FetchError>>,
    {
        let repo = self.root.join(dir_name);
        let mut record = ArchiveRecord::load(&repo, &course.id);

        // Paths already taken, for deterministic collision disambiguation
        let mut taken: HashSet<PathBuf> =
            record.entries.values().map(|e| e.path.clone()).collect();

        let mut changed_paths: Vec<PathBuf> = Vec::new();
        let mut failures: Vec<NodeFailure> = Vec::new();
        let mut added = 0usize;
        let mut updated = 0usize;
        let mut skipped = 0usize;
        let mut repo_ready = repo.join(".git").exists();

        for assignment in &tree.assignments {
            let mut assignment_dir = sanitize_dir_name(&assignment.name);
            if assignment_dir.is_empty() {
                assignment_dir = sanitize_file_name(&assignment.id);
            }

            for file in &assignment.files {
                let existing = record.entries.get(file.id.as_str());
                if let Some(entry) = existing
                    && entry.fingerprint == file.fingerprint
                {
                    skipped += 1;
                    continue;
                }

                let content = match fetch(file.clone()).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(course = %course.id, file = %file.id, error = %e, "node fetch failed");
                        failures.push(node_failure(&e));
                        continue;
                    }
                };

                // First write initializes the repository
                if !repo_ready {
                    std::fs::create_dir_all(&repo).map_err(|source| ArchiveError::Io {
                        path: repo.clone(),
                        source,
                    })?;
                    self.versioner.init(&repo).await?;
                    repo_ready = true;
                }

                let is_new = existing.is_none();
                let rel_path = match existing {
                    // Stable across runs for a given remote identifier
                    Some(entry) => entry.path.clone(),
                    None => derive_path(&assignment_dir, file, content.remote_name.as_deref(), &taken),
                };

                if let Err(source) = write_node(&repo, &rel_path, &content.bytes) {
                    tracing::warn!(
                        course = %course.id,
                        file = %file.id,
                        path = %rel_path.display(),
                        error = %source,
                        "node write failed"
                    );
                    failures.push(NodeFailure {
                        file_id: file.id.clone(),
                        kind: NodeFailureKind::Io,
                        detail: source.to_string(),
                    });
                    continue;
                }

                taken.insert(rel_path.clone());
                record.entries.insert(
                    file.id.0.clone(),
                    RecordEntry {
                        fingerprint: file.fingerprint.clone(),
                        path: rel_path.clone(),
                        sha256: content.digest,
                        archived_at: Utc::now(),
                    },
                );
                // Persisted per node, never batched, so interruption leaves
                // the record consistent with what is actually on disk
                record.save(&repo)?;

                if is_new {
                    added += 1;
                } else {
                    updated += 1;
                }
                changed_paths.push(rel_path);
            }
        }

        let mut committed = false;
        if !changed_paths.is_empty() {
            record.synced_at = Some(Utc::now());
            record.save(&repo)?;

            let mut to_stage = changed_paths.clone();
            to_stage.push(PathBuf::from(RECORD_FILE_NAME));
            self.versioner.stage(&repo, &to_stage).await?;

            let message = commit_message(added, updated);
            self.versioner.commit(&repo, &message).await?;
            committed = true;
            tracing::info!(course = %course.id, message = %message, "course committed");
        } else {
            tracing::debug!(course = %course.id, skipped, "course already current");
        }

        let state = if failures.is_empty() {
            CourseState::Complete
        } else {
            CourseState::Partial
        };
        Ok(CourseOutcome {
            course: course.clone(),
            state,
            fetched: added + updated,
            skipped,
            failures,
            committed,
            error: None,
        })
    }
}

fn commit_message(added: usize, updated: usize) -> String {
    format!("Archive sync: {added} added, {updated} updated")
}

fn node_failure(e: &FetchError) -> NodeFailure {
    let kind = match e {
        FetchError::NotFound { .. } => NodeFailureKind::NotFound,
        FetchError::Forbidden { .. } => NodeFailureKind::Forbidden,
        FetchError::RateLimited { .. } => NodeFailureKind::RateLimited,
        FetchError::Transport { .. } => NodeFailureKind::Transport,
    };
    NodeFailure {
        file_id: crate::types::FileId::new(e.file_id()),
        kind,
        detail: e.to_string(),
    }
}

/// Derive the relative path for a newly archived file
///
/// Preference order for the filename: the sanitized Content-Disposition
/// name, the sanitized listing name, the remote id. A collision with an
/// already-taken path gets a deterministic id suffix, never an overwrite.
fn derive_path(
    assignment_dir: &str,
    file: &MaterialFile,
    remote_name: Option<&str>,
    taken: &HashSet<PathBuf>,
) -> PathBuf {
    let mut name = remote_name
        .map(sanitize_file_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| sanitize_file_name(&file.name));
    if name.is_empty() {
        name = sanitize_file_name(file.id.as_str());
    }

    let candidate = Path::new(assignment_dir).join(&name);
    if !taken.contains(&candidate) {
        return candidate;
    }
    Path::new(assignment_dir).join(suffix_file_name(&name, file.id.as_str()))
}

fn write_node(repo: &Path, rel_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let full = repo.join(rel_path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, bytes)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, FileKind};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory versioner that records calls instead of shelling out
    #[derive(Default)]
    struct FakeVersioner {
        inits: Mutex<Vec<PathBuf>>,
        staged: Mutex<Vec<Vec<PathBuf>>>,
        commits: Mutex<Vec<String>>,
        fail_commits: bool,
    }

    #[async_trait::async_trait]
    impl Versioner for FakeVersioner {
        async fn init(&self, repo: &Path) -> Result<(), ArchiveError> {
            self.inits.lock().unwrap().push(repo.to_path_buf());
            Ok(())
        }

        async fn stage(&self, _repo: &Path, paths: &[PathBuf]) -> Result<(), ArchiveError> {
            self.staged.lock().unwrap().push(paths.to_vec());
            Ok(())
        }

        async fn commit(&self, repo: &Path, message: &str) -> Result<(), ArchiveError> {
            if self.fail_commits {
                return Err(ArchiveError::Commit {
                    repo: repo.to_path_buf(),
                    reason: "simulated failure".to_string(),
                });
            }
            self.commits.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn course() -> Course {
        Course {
            id: CourseId::new("c-1"),
            name: "CS101".to_string(),
            short_name: None,
            term: None,
        }
    }

    fn file(id: &str, name: &str, fingerprint: &str) -> MaterialFile {
        MaterialFile {
            id: FileId::new(id),
            name: name.to_string(),
            url: format!("/files/{id}"),
            kind: FileKind::Submission,
            fingerprint: Fingerprint(fingerprint.to_string()),
        }
    }

    fn tree(files: Vec<MaterialFile>) -> MaterialTree {
        MaterialTree {
            course_id: CourseId::new("c-1"),
            assignments: vec![crate::types::Assignment {
                id: "a-1".to_string(),
                name: "HW 1".to_string(),
                due_at: None,
                graded: None,
                files,
            }],
        }
    }

    fn writer(root: &Path) -> (ArchiveWriter, Arc<FakeVersioner>) {
        let versioner = Arc::new(FakeVersioner::default());
        let config = ArchiveConfig {
            root: root.to_path_buf(),
            git_binary: None,
        };
        (ArchiveWriter::new(&config, versioner.clone()), versioner)
    }

    fn fetch_counting(
        counter: Arc<AtomicUsize>,
    ) -> impl Fn(MaterialFile) -> std::future::Ready<Result<FetchedContent, FetchError>> {
        move |file| {
            counter.fetch_add(1, Ordering::SeqCst);
            let bytes = format!("content of {}", file.id).into_bytes();
            let digest = ContentDigest::of(&bytes);
            std::future::ready(Ok(FetchedContent {
                bytes,
                digest,
                remote_name: None,
            }))
        }
    }

    #[tokio::test]
    async fn first_sync_fetches_writes_and_commits_once() {
        let dir = TempDir::new().unwrap();
        let (writer, versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));

        let tree = tree(vec![file("f-1", "hw1.pdf", "h1"), file("f-2", "notes.txt", "h2")]);
        let outcome = writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter.clone()))
            .await
            .unwrap();

        assert_eq!(outcome.state, CourseState::Complete);
        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.skipped, 0);
        assert!(outcome.committed);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let repo = dir.path().join("CS101");
        assert!(repo.join("HW 1").join("hw1.pdf").exists());
        assert!(repo.join("HW 1").join("notes.txt").exists());

        let record = ArchiveRecord::load(&repo, &CourseId::new("c-1"));
        assert_eq!(record.entries.len(), 2);
        assert!(record.synced_at.is_some());

        assert_eq!(versioner.inits.lock().unwrap().len(), 1);
        assert_eq!(
            versioner.commits.lock().unwrap().as_slice(),
            ["Archive sync: 2 added, 0 updated"]
        );
        // The record file is part of the commit
        let staged = versioner.staged.lock().unwrap();
        assert!(staged[0].contains(&PathBuf::from(RECORD_FILE_NAME)));
    }

    #[tokio::test]
    async fn second_sync_with_no_change_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let (writer, versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));
        let tree = tree(vec![file("f-1", "hw1.pdf", "h1")]);

        writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter.clone()))
            .await
            .unwrap();
        let record_bytes =
            std::fs::read(dir.path().join("CS101").join(RECORD_FILE_NAME)).unwrap();

        let outcome = writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter.clone()))
            .await
            .unwrap();

        assert_eq!(outcome.state, CourseState::Complete);
        assert_eq!(outcome.fetched, 0);
        assert_eq!(outcome.skipped, 1);
        assert!(!outcome.committed);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "no second fetch");
        assert_eq!(versioner.commits.lock().unwrap().len(), 1, "no second commit");

        // Byte-identical archive, record included
        assert_eq!(
            std::fs::read(dir.path().join("CS101").join(RECORD_FILE_NAME)).unwrap(),
            record_bytes
        );
    }

    #[tokio::test]
    async fn changed_fingerprint_updates_exactly_one_node() {
        let dir = TempDir::new().unwrap();
        let (writer, versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));

        // A1 stays at h1, A2 moves from h0 to h2
        let first = tree(vec![file("f-1", "a1.pdf", "h1"), file("f-2", "a2.pdf", "h0")]);
        writer
            .sync(&course(), "CS101", &first, fetch_counting(counter.clone()))
            .await
            .unwrap();

        let a1_before =
            std::fs::read(dir.path().join("CS101").join("HW 1").join("a1.pdf")).unwrap();
        counter.store(0, Ordering::SeqCst);

        let second = tree(vec![file("f-1", "a1.pdf", "h1"), file("f-2", "a2.pdf", "h2")]);
        let outcome = writer
            .sync(&course(), "CS101", &second, fetch_counting(counter.clone()))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1, "only the changed node fetches");
        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(
            versioner.commits.lock().unwrap().last().unwrap(),
            "Archive sync: 0 added, 1 updated"
        );
        // Untouched node stays byte-identical
        assert_eq!(
            std::fs::read(dir.path().join("CS101").join("HW 1").join("a1.pdf")).unwrap(),
            a1_before
        );

        let record = ArchiveRecord::load(&dir.path().join("CS101"), &CourseId::new("c-1"));
        assert_eq!(record.entries["f-2"].fingerprint, Fingerprint("h2".to_string()));
        assert_eq!(record.entries["f-1"].fingerprint, Fingerprint("h1".to_string()));
    }

    #[tokio::test]
    async fn colliding_names_get_distinct_deterministic_paths() {
        let dir = TempDir::new().unwrap();
        let (writer, _versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));

        let tree = tree(vec![
            file("f-1", "report.pdf", "h1"),
            file("f-2", "report.pdf", "h2"),
        ]);
        let outcome = writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter))
            .await
            .unwrap();

        assert_eq!(outcome.fetched, 2);
        let hw = dir.path().join("CS101").join("HW 1");
        assert!(hw.join("report.pdf").exists());
        assert!(hw.join("report.f-2.pdf").exists());

        let record = ArchiveRecord::load(&dir.path().join("CS101"), &CourseId::new("c-1"));
        assert_ne!(record.entries["f-1"].path, record.entries["f-2"].path);
    }

    #[tokio::test]
    async fn recorded_paths_stay_stable_when_remote_name_changes() {
        let dir = TempDir::new().unwrap();
        let (writer, _versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));

        let first = tree(vec![file("f-1", "draft.pdf", "h1")]);
        writer
            .sync(&course(), "CS101", &first, fetch_counting(counter.clone()))
            .await
            .unwrap();

        // Same id, new display name and content
        let second = tree(vec![file("f-1", "final.pdf", "h2")]);
        writer
            .sync(&course(), "CS101", &second, fetch_counting(counter))
            .await
            .unwrap();

        let record = ArchiveRecord::load(&dir.path().join("CS101"), &CourseId::new("c-1"));
        assert_eq!(
            record.entries["f-1"].path,
            PathBuf::from("HW 1").join("draft.pdf"),
            "path is stable for a given remote identifier"
        );
    }

    #[tokio::test]
    async fn node_fetch_failure_is_isolated_to_the_node() {
        let dir = TempDir::new().unwrap();
        let (writer, versioner) = writer(dir.path());

        let tree = tree(vec![file("f-1", "ok.pdf", "h1"), file("f-2", "gone.pdf", "h2")]);
        let outcome = writer
            .sync(&course(), "CS101", &tree, |file: MaterialFile| {
                std::future::ready(if file.id.as_str() == "f-2" {
                    Err(FetchError::NotFound { id: file.id.0 })
                } else {
                    let bytes = b"ok".to_vec();
                    Ok(FetchedContent {
                        digest: ContentDigest::of(&bytes),
                        bytes,
                        remote_name: None,
                    })
                })
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, CourseState::Partial);
        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, NodeFailureKind::NotFound);
        assert_eq!(outcome.failures[0].file_id.as_str(), "f-2");
        // The successful node is still committed
        assert!(outcome.committed);
        assert_eq!(versioner.commits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_failure_fails_the_course_but_keeps_record_consistent() {
        let dir = TempDir::new().unwrap();
        let versioner = Arc::new(FakeVersioner {
            fail_commits: true,
            ..FakeVersioner::default()
        });
        let config = ArchiveConfig {
            root: dir.path().to_path_buf(),
            git_binary: None,
        };
        let writer = ArchiveWriter::new(&config, versioner);
        let counter = Arc::new(AtomicUsize::new(0));

        let tree = tree(vec![file("f-1", "hw1.pdf", "h1")]);
        let err = writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter))
            .await
            .unwrap_err();

        assert!(matches!(err, ArchiveError::Commit { .. }));
        // The record matches the bytes on disk, so a re-run re-commits
        let record = ArchiveRecord::load(&dir.path().join("CS101"), &CourseId::new("c-1"));
        assert_eq!(record.entries.len(), 1);
        assert!(dir.path().join("CS101").join("HW 1").join("hw1.pdf").exists());
    }

    #[tokio::test]
    async fn empty_tree_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let (writer, versioner) = writer(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));

        let tree = MaterialTree {
            course_id: CourseId::new("c-1"),
            assignments: vec![],
        };
        let outcome = writer
            .sync(&course(), "CS101", &tree, fetch_counting(counter))
            .await
            .unwrap();

        assert_eq!(outcome.state, CourseState::Complete);
        assert!(!outcome.committed);
        assert!(!dir.path().join("CS101").exists(), "repo is initialized lazily");
        assert!(versioner.inits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_name_from_content_disposition_wins_for_new_files() {
        let dir = TempDir::new().unwrap();
        let (writer, _versioner) = writer(dir.path());

        let tree = tree(vec![file("f-1", "download", "h1")]);
        writer
            .sync(&course(), "CS101", &tree, |_file: MaterialFile| {
                let bytes = b"x".to_vec();
                std::future::ready(Ok(FetchedContent {
                    digest: ContentDigest::of(&bytes),
                    bytes,
                    remote_name: Some("Graded Copy.pdf".to_string()),
                }))
            })
            .await
            .unwrap();

        assert!(
            dir.path()
                .join("CS101")
                .join("HW 1")
                .join("Graded Copy.pdf")
                .exists()
        );
    }

    #[test]
    fn dir_names_disambiguate_collisions() {
        let mk = |id: &str, name: &str| Course {
            id: CourseId::new(id),
            name: name.to_string(),
            short_name: None,
            term: None,
        };
        let courses = vec![
            mk("c-1", "CS101!"),
            mk("c-2", "CS101?"),
            mk("c-3", "Physics"),
        ];
        let names = ArchiveWriter::derive_dir_names(&courses);

        assert_eq!(names[&CourseId::new("c-1")], "CS101 c-1");
        assert_eq!(names[&CourseId::new("c-2")], "CS101 c-2");
        assert_eq!(names[&CourseId::new("c-3")], "Physics");
    }

    #[test]
    fn corrupt_record_starts_fresh() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(RECORD_FILE_NAME), b"not json").unwrap();
        let record = ArchiveRecord::load(dir.path(), &CourseId::new("c-1"));
        assert!(record.entries.is_empty());
    }
}

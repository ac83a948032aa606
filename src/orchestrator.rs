//! Run orchestration
//!
//! Wires the session store, authentication flow, crawler, fetcher, and
//! archive writer into one run: restore or establish a session, enumerate
//! courses, and sync each course onto its repository with bounded
//! concurrency. A failing course never aborts the run; its outcome is
//! recorded and the remaining courses proceed.
//!
//! Session recovery is deliberately conservative: when the remote rejects
//! the session mid-run, the persisted session is invalidated and exactly one
//! re-authentication is performed for the whole run, after which the failed
//! call is retried once. Workers that observe the rejection concurrently
//! share the refreshed session instead of re-authenticating again.

use crate::archive::ArchiveWriter;
use crate::auth::{AuthenticationFlow, TwoFactorHandler};
use crate::config::Config;
use crate::crawler::HierarchyCrawler;
use crate::error::{CrawlError, Error};
use crate::fetcher::ContentFetcher;
use crate::git::{CliGit, Versioner};
use crate::session_store::SessionStore;
use crate::types::{Course, CourseOutcome, Credentials, RunReport, Session};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Drives one full archiving run
pub struct Orchestrator {
    config: Config,
    store: SessionStore,
    auth: AuthenticationFlow,
    crawler: HierarchyCrawler,
    fetcher: Arc<ContentFetcher>,
    writer: ArchiveWriter,
}

impl Orchestrator {
    /// Create an orchestrator, discovering the git binary from the
    /// configuration or PATH
    pub fn new(config: Config) -> crate::Result<Self> {
        let versioner: Arc<dyn Versioner> = match &config.archive.git_binary {
            Some(path) => Arc::new(CliGit::new(path.clone())),
            None => Arc::new(CliGit::from_path().ok_or_else(|| Error::Config {
                message: "git binary not found in PATH".to_string(),
                key: Some("archive.git_binary".to_string()),
            })?),
        };
        Self::with_versioner(config, versioner)
    }

    /// Create an orchestrator with an explicit versioning backend
    pub fn with_versioner(config: Config, versioner: Arc<dyn Versioner>) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.platform.request_timeout)
            .user_agent(&config.platform.user_agent)
            .build()?;

        let store = SessionStore::from_config(&config.session);
        let auth = AuthenticationFlow::new(client.clone(), &config)?;
        let crawler = HierarchyCrawler::new(client.clone(), &config)?;
        let fetcher = Arc::new(ContentFetcher::new(client, &config)?);
        let writer = ArchiveWriter::new(&config.archive, versioner);

        Ok(Self {
            config,
            store,
            auth,
            crawler,
            fetcher,
            writer,
        })
    }

    /// Perform one run: authenticate (or restore), list courses, and sync
    /// each onto its repository
    ///
    /// Returns a [`RunReport`] with per-course outcomes in listing order.
    /// Only failures that prevent the run from proceeding at all (failed
    /// authentication, failed course listing) surface as `Err`.
    pub async fn run(
        &self,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
    ) -> crate::Result<RunReport> {
        let started_at = Utc::now();
        let session = Arc::new(RwLock::new(self.establish_session(credentials, handler).await?));
        let reauth_done = Arc::new(Mutex::new(false));

        let courses = self
            .list_courses_recovering(credentials, handler, &session, &reauth_done)
            .await?;
        let dir_names = ArchiveWriter::derive_dir_names(&courses);

        let concurrency = self.config.crawl.max_concurrent_courses.max(1);
        let outcomes: Vec<CourseOutcome> = futures::stream::iter(courses)
            .map(|course| {
                let dir_name = dir_names
                    .get(&course.id)
                    .cloned()
                    .unwrap_or_else(|| course.id.as_str().to_string());
                let session = Arc::clone(&session);
                let reauth_done = Arc::clone(&reauth_done);
                async move {
                    self.sync_course(course, dir_name, credentials, handler, session, reauth_done)
                        .await
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let report = RunReport {
            courses: outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            courses = report.courses.len(),
            state = ?report.state(),
            "run finished"
        );
        Ok(report)
    }

    /// Restore the persisted session, or authenticate from scratch
    async fn establish_session(
        &self,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
    ) -> crate::Result<Session> {
        if let Some(session) = self.store.load() {
            if !session.is_expired(Utc::now()) {
                tracing::info!(user = %session.user, "reusing persisted session");
                return Ok(session);
            }
            tracing::info!(user = %session.user, "persisted session expired");
            self.store.invalidate()?;
        }

        let session = self.auth.authenticate(credentials, handler).await?;
        self.store.save(&session)?;
        Ok(session)
    }

    async fn list_courses_recovering(
        &self,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
        session: &RwLock<Session>,
        reauth_done: &Mutex<bool>,
    ) -> crate::Result<Vec<Course>> {
        let snapshot = session.read().await.clone();
        match self.crawler.list_courses(&snapshot).await {
            Ok(courses) => Ok(courses),
            Err(CrawlError::Unauthorized) => {
                if !self
                    .recover_session(&snapshot.token, credentials, handler, session, reauth_done)
                    .await?
                {
                    return Err(CrawlError::Unauthorized.into());
                }
                let fresh = session.read().await.clone();
                Ok(self.crawler.list_courses(&fresh).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sync one course end to end; all failures are captured in the outcome
    async fn sync_course(
        &self,
        course: Course,
        dir_name: String,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
        session: Arc<RwLock<Session>>,
        reauth_done: Arc<Mutex<bool>>,
    ) -> CourseOutcome {
        if let Some(threshold) = self.config.crawl.update_threshold
            && let Some(synced_at) = self.writer.last_synced(&course, &dir_name)
            && let Ok(threshold) = chrono::Duration::from_std(threshold)
            && Utc::now() - synced_at < threshold
        {
            tracing::info!(course = %course.id, %synced_at, "archive is fresh, skipping");
            return CourseOutcome::fresh(course);
        }

        let snapshot = session.read().await.clone();
        let tree = match self.crawler.list_materials(&snapshot, &course).await {
            Ok(tree) => Ok(tree),
            Err(CrawlError::Unauthorized) => {
                let recovered = self
                    .recover_session(&snapshot.token, credentials, handler, &session, &reauth_done)
                    .await;
                match recovered {
                    Ok(true) => {
                        let fresh = session.read().await.clone();
                        self.crawler.list_materials(&fresh, &course).await
                    }
                    Ok(false) => Err(CrawlError::Unauthorized),
                    Err(e) => {
                        tracing::error!(course = %course.id, error = %e, "session recovery failed");
                        return CourseOutcome::failed(course, e.to_string());
                    }
                }
            }
            Err(e) => Err(e),
        };
        let tree = match tree {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!(course = %course.id, error = %e, "course listing failed");
                return CourseOutcome::failed(course, e.to_string());
            }
        };

        let fetch_session = session.read().await.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let delay = self.fetcher.request_delay();
        // Politeness delay goes between fetches, never before the first one
        let first_fetch = Arc::new(AtomicBool::new(true));
        let result = self
            .writer
            .sync(&course, &dir_name, &tree, move |file| {
                let fetcher = Arc::clone(&fetcher);
                let session = fetch_session.clone();
                let first_fetch = Arc::clone(&first_fetch);
                async move {
                    if let Some(delay) = delay
                        && !first_fetch.swap(false, Ordering::SeqCst)
                    {
                        tokio::time::sleep(delay).await;
                    }
                    fetcher.fetch(&session, &file).await
                }
            })
            .await;

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(course = %course.id, error = %e, "course archiving failed");
                CourseOutcome::failed(course, e.to_string())
            }
        }
    }

    /// Refresh the shared session after the remote rejected it
    ///
    /// Returns true when a usable session is available for a retry: either
    /// another worker already refreshed it, or this call performed the run's
    /// single re-authentication. Returns false when the one re-auth was
    /// already spent on the token the caller holds.
    async fn recover_session(
        &self,
        stale_token: &str,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
        session: &RwLock<Session>,
        reauth_done: &Mutex<bool>,
    ) -> crate::Result<bool> {
        let mut done = reauth_done.lock().await;

        if session.read().await.token != stale_token {
            // Another worker refreshed while we waited on the lock
            return Ok(true);
        }
        if *done {
            return Ok(false);
        }

        tracing::warn!("session rejected by the remote, re-authenticating");
        self.store.invalidate()?;
        let fresh = self.auth.authenticate(credentials, handler).await?;
        self.store.save(&fresh)?;
        *session.write().await = fresh;
        *done = true;
        Ok(true)
    }
}

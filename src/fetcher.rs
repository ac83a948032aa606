//! Content downloading with retry and rate-limit handling
//!
//! Downloads the bytes behind each discovered material file. Two bounded
//! retry policies apply: HTTP 429 backs off exponentially with jitter, and
//! transient transport failures back off linearly. Structural failures
//! (404/403) are never retried. Fetching is idempotent: unchanged remote
//! content yields byte-identical output and an identical digest.

use crate::config::{Config, FetchConfig};
use crate::error::{Error, FetchError};
use crate::retry::{backoff_delay, with_retry};
use crate::types::{ContentDigest, MaterialFile, Session};
use std::time::Duration;
use url::Url;

/// Bytes and metadata of one fetched file
#[derive(Clone, Debug)]
pub struct FetchedContent {
    /// Raw file content
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`
    pub digest: ContentDigest,
    /// Filename reported via Content-Disposition, if any
    pub remote_name: Option<String>,
}

/// Downloads material file content using an authenticated session
pub struct ContentFetcher {
    client: reqwest::Client,
    base_url: Url,
    fetch: FetchConfig,
}

impl ContentFetcher {
    /// Create a fetcher from the shared HTTP client and configuration
    pub fn new(client: reqwest::Client, config: &Config) -> crate::Result<Self> {
        let base_url = Url::parse(&config.platform.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL: {e}"),
            key: Some("platform.base_url".to_string()),
        })?;
        Ok(Self {
            client,
            base_url,
            fetch: config.fetch.clone(),
        })
    }

    /// Download one file, honoring both retry policies
    pub async fn fetch(
        &self,
        session: &Session,
        file: &MaterialFile,
    ) -> Result<FetchedContent, FetchError> {
        let mut rate_attempt = 0u32;
        loop {
            let result = with_retry(&self.fetch.transport, || {
                self.fetch_once(session, file)
            })
            .await;

            match result {
                Ok(content) => return Ok(content),
                Err(FetchError::RateLimited { .. })
                    if rate_attempt < self.fetch.rate_limit.max_attempts =>
                {
                    rate_attempt += 1;
                    let delay = backoff_delay(&self.fetch.rate_limit, rate_attempt);
                    tracing::warn!(
                        file = %file.id,
                        attempt = rate_attempt,
                        max_attempts = self.fetch.rate_limit.max_attempts,
                        delay_ms = delay.as_millis(),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(FetchError::RateLimited { id, .. }) => {
                    tracing::error!(file = %id, "rate-limit backoff exhausted");
                    return Err(FetchError::RateLimited {
                        id,
                        attempts: rate_attempt + 1,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(
        &self,
        session: &Session,
        file: &MaterialFile,
    ) -> Result<FetchedContent, FetchError> {
        let url = self.resolve_url(&file.url, &file.id.0)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, session.authorization())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                id: file.id.0.clone(),
                reason: e.to_string(),
            })?;

        match response.status() {
            s if s.is_success() => {
                let remote_name = content_disposition_filename(&response);
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Transport {
                        id: file.id.0.clone(),
                        reason: e.to_string(),
                    })?
                    .to_vec();
                let digest = ContentDigest::of(&bytes);
                tracing::debug!(file = %file.id, size = bytes.len(), "fetched");
                Ok(FetchedContent {
                    bytes,
                    digest,
                    remote_name,
                })
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited {
                id: file.id.0.clone(),
                attempts: 1,
            }),
            reqwest::StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                id: file.id.0.clone(),
            }),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(FetchError::Forbidden {
                    id: file.id.0.clone(),
                })
            }
            s => Err(FetchError::Transport {
                id: file.id.0.clone(),
                reason: format!("request failed with status {s}"),
            }),
        }
    }

    fn resolve_url(&self, raw: &str, id: &str) -> Result<Url, FetchError> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url.join(raw).map_err(|e| FetchError::Transport {
                    id: id.to_string(),
                    reason: format!("invalid content URL {raw}: {e}"),
                })
            }
            Err(e) => Err(FetchError::Transport {
                id: id.to_string(),
                reason: format!("invalid content URL {raw}: {e}"),
            }),
        }
    }

    /// Configured politeness delay between successive fetches within a
    /// course; applied by the caller, not by [`fetch`](Self::fetch) itself
    pub fn request_delay(&self) -> Option<Duration> {
        self.fetch.request_delay
    }
}

/// Extract a filename from the Content-Disposition header, if present
///
/// Handles both the quoted `filename="..."` form and the RFC 5987
/// `filename*=charset''encoded` form. The extension is kept; the archive
/// layer sanitizes the result before use.
fn content_disposition_filename(response: &reqwest::Response) -> Option<String> {
    let value = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;

    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            // Format: charset'lang'encoded-filename
            if let Some(idx) = encoded.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            let name = name.trim_matches('"');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

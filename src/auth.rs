//! SSO + two-factor authentication flow
//!
//! Drives the login sequence when no valid persisted session exists:
//! submit primary credentials, answer an optional two-factor challenge via a
//! collaborator-provided interactive handler, and construct a [`Session`]
//! from the issued token.
//!
//! The 2FA wait is an explicit suspension point with a timeout, not an
//! open-ended callback loop. A rejected code is never retried automatically;
//! repeated guesses risk locking the account.

use crate::config::Config;
use crate::error::{AuthError, Error};
use crate::types::{Credentials, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Collaborator-provided source of the interactive two-factor code
///
/// Invoked at most once per authentication attempt, under the configured
/// timeout. Implementations typically prompt a human; tests supply a fake.
#[async_trait]
pub trait TwoFactorHandler: Send + Sync {
    /// Obtain the one-time code (e.g., by prompting the user)
    async fn obtain_code(&self) -> String;
}

/// A handler with a fixed code, useful for tests and scripted flows
#[derive(Clone, Debug)]
pub struct StaticCodeHandler(pub String);

#[async_trait]
impl TwoFactorHandler for StaticCodeHandler {
    async fn obtain_code(&self) -> String {
        self.0.clone()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum LoginResponse {
    Ok {
        token: String,
        expires_at: Option<DateTime<Utc>>,
    },
    TwoFactorRequired {
        challenge: String,
    },
}

#[derive(Serialize)]
struct TwoFactorRequest<'a> {
    challenge: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TwoFactorResponse {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Drives the SSO + 2FA login sequence
pub struct AuthenticationFlow {
    client: reqwest::Client,
    base_url: Url,
    two_factor_timeout: Duration,
}

impl AuthenticationFlow {
    /// Create a flow from the shared HTTP client and configuration
    pub fn new(client: reqwest::Client, config: &Config) -> crate::Result<Self> {
        let base_url = Url::parse(&config.platform.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL: {e}"),
            key: Some("platform.base_url".to_string()),
        })?;
        Ok(Self {
            client,
            base_url,
            two_factor_timeout: config.auth.two_factor_timeout,
        })
    }

    /// Perform the full login sequence and return a usable session
    ///
    /// The primary credential submission is retried once automatically on a
    /// transient transport failure (no code has been submitted at that
    /// point). A rejected code surfaces as [`AuthError::TwoFactorRejected`]
    /// without retry.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        handler: &dyn TwoFactorHandler,
    ) -> Result<Session, AuthError> {
        tracing::info!(user = %credentials.email, "authenticating");

        let response = match self.submit_credentials(credentials).await {
            Ok(response) => response,
            Err(AuthError::Transport(reason)) => {
                tracing::warn!(error = %reason, "login transport failure, retrying once");
                self.submit_credentials(credentials).await?
            }
            Err(e) => return Err(e),
        };

        let (token, expires_at) = match response {
            LoginResponse::Ok { token, expires_at } => (token, expires_at),
            LoginResponse::TwoFactorRequired { challenge } => {
                self.complete_two_factor(&challenge, handler).await?
            }
        };

        let session = Session {
            token,
            user: credentials.email.clone(),
            created_at: Utc::now(),
            expires_at,
        };
        tracing::info!(user = %session.user, "authentication succeeded");
        Ok(session)
    }

    async fn submit_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<LoginResponse, AuthError> {
        let url = self.endpoint("/api/v1/session")?;
        let response = self
            .client
            .post(url)
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<LoginResponse>()
                .await
                .map_err(|e| AuthError::Transport(format!("malformed login response: {e}"))),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(AuthError::CredentialsRejected {
                    user: credentials.email.clone(),
                })
            }
            s => Err(AuthError::Transport(format!(
                "login request failed with status {s}"
            ))),
        }
    }

    async fn complete_two_factor(
        &self,
        challenge: &str,
        handler: &dyn TwoFactorHandler,
    ) -> Result<(String, Option<DateTime<Utc>>), AuthError> {
        tracing::info!("two-factor challenge received, waiting for code");

        let code = tokio::time::timeout(self.two_factor_timeout, handler.obtain_code())
            .await
            .map_err(|_| AuthError::TwoFactorTimeout {
                waited: self.two_factor_timeout,
            })?;

        let url = self.endpoint("/api/v1/session/two_factor")?;
        let response = self
            .client
            .post(url)
            .json(&TwoFactorRequest {
                challenge,
                code: &code,
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                let body = response.json::<TwoFactorResponse>().await.map_err(|e| {
                    AuthError::Transport(format!("malformed two-factor response: {e}"))
                })?;
                Ok((body.token, body.expires_at))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(AuthError::TwoFactorRejected)
            }
            s => Err(AuthError::Transport(format!(
                "two-factor request failed with status {s}"
            ))),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Transport(format!("invalid endpoint {path}: {e}")))
    }
}

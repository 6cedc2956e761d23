//! Auth service
//!
//! Implements session management on top of the external identity provider:
//! - Exchange of a provider session id for a local session
//! - Just-in-time user provisioning (user + zero-state reward)
//! - Session resolution with expiry
//! - Logout and the periodic expired-session sweep

use crate::db::repositories::{RewardRepository, SessionRepository, UserRepository};
use crate::models::{Reward, Session, User};
use crate::services::identity::{IdentityError, IdentityProvider};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for auth service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// No provider session id was supplied
    #[error("Missing session ID")]
    MissingSessionId,

    /// The identity provider refused the session id
    #[error("Invalid session: {0}")]
    Rejected(String),

    /// The identity provider could not be reached in time
    #[error("Auth error: {0}")]
    Unavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<IdentityError> for AuthServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(msg) => AuthServiceError::Rejected(msg),
            IdentityError::Unavailable(msg) => AuthServiceError::Unavailable(msg),
        }
    }
}

/// Result of a successful session exchange
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionGrant {
    pub user: User,
    pub session_token: String,
}

/// Auth service for provider exchange and session lifecycle
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    reward_repo: Arc<dyn RewardRepository>,
    session_expiration_days: i64,
}

impl AuthService {
    /// Create a new auth service with the default 7-day sessions
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        reward_repo: Arc<dyn RewardRepository>,
    ) -> Self {
        Self {
            identity,
            user_repo,
            session_repo,
            reward_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Override the session lifetime
    pub fn with_session_expiration(mut self, days: i64) -> Self {
        self.session_expiration_days = days;
        self
    }

    /// Session lifetime in seconds, for the session cookie's `Max-Age`
    pub fn session_max_age_secs(&self) -> i64 {
        self.session_expiration_days.saturating_mul(24 * 60 * 60)
    }

    /// Exchange a provider session id for a local session.
    ///
    /// Returning users are matched by email. First-time users get a user
    /// record and a zero-state reward record. The session token is the one
    /// the provider supplied, or a fresh random token when it supplied none.
    ///
    /// # Errors
    ///
    /// - `MissingSessionId` if `external_session_id` is absent or blank
    /// - `Rejected` if the provider refused the id
    /// - `Unavailable` on transport failure, timeout or malformed response
    /// - `InternalError` for database errors
    pub async fn establish_session(
        &self,
        external_session_id: Option<&str>,
    ) -> Result<SessionGrant, AuthServiceError> {
        let session_id = external_session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthServiceError::MissingSessionId)?;

        let identity = self.identity.exchange(session_id).await.map_err(|e| {
            tracing::warn!("Identity exchange failed: {}", e);
            AuthServiceError::from(e)
        })?;

        let existing = self
            .user_repo
            .get_by_email(&identity.email)
            .await
            .context("Failed to look up user by email")?;

        let user = match existing {
            Some(user) => user,
            None => {
                let user = User::new(
                    identity.id.clone(),
                    identity.email.clone(),
                    identity.name.clone(),
                    identity.picture.clone(),
                );
                self.user_repo
                    .create(&user)
                    .await
                    .context("Failed to create user")?;
                self.reward_repo
                    .create(&Reward::new(user.id.as_str()))
                    .await
                    .context("Failed to initialize rewards")?;
                tracing::info!("Provisioned new user {}", user.id);
                user
            }
        };

        let token = identity
            .session_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        let now = Utc::now();
        let expires_at = Duration::try_days(self.session_expiration_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Session lifetime of {} days is out of range",
                    self.session_expiration_days
                )
            })?;
        let session = Session {
            user_id: user.id.clone(),
            session_token: token,
            expires_at,
            created_at: now,
        };
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(SessionGrant {
            user,
            session_token: session.session_token,
        })
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for an unknown token, an expired session (which is
    /// deleted on the spot) or a session whose user no longer exists.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<User>, AuthServiceError> {
        let session = self
            .session_repo
            .get_by_token(token)
            .await
            .context("Failed to get session")?;

        let session = match session {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(&session.user_id)
            .await
            .context("Failed to get session user")?;

        Ok(user)
    }

    /// Invalidate a session. Unknown tokens are not an error.
    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Remove every expired session. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        let removed = self
            .session_repo
            .delete_expired(Utc::now())
            .await
            .context("Failed to clean up expired sessions")?;
        Ok(removed)
    }
}

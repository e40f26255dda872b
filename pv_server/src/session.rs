//! Cookie sessions on top of `tower-sessions`.
//!
//! [`session_manager`] builds the layer that loads the caller's session from a
//! signed `pv_session` cookie. Handlers extract a [`PvSession`] to read the
//! logged-in user and to queue flash notices for the next rendered view.
//! [`require_session`] guards the admin routes.
//!
//! A session is stored, and its cookie issued, only once something is written
//! to it. Requests that never flash or log in leave no trace.

use std::time::Duration;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::error::PvError;

pub const SESSION_COOKIE: &str = "pv_session";

/// Longest accepted session lifetime.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const USER_KEY: &str = "user";
const NOTICES_KEY: &str = "notices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Reject lifetimes of zero or beyond [`MAX_SESSION_TTL`].
pub fn check_ttl(ttl: Duration) -> Result<Duration, PvError> {
    if ttl.is_zero() || ttl > MAX_SESSION_TTL {
        return Err(PvError::InvalidInput(format!(
            "Session lifetime must be between 1 and {} seconds",
            MAX_SESSION_TTL.as_secs()
        )));
    }
    Ok(ttl)
}

/// Signing key and inactivity timeout for session cookies.
#[derive(Clone)]
pub struct SessionSettings {
    key: Key,
    ttl: time::Duration,
}

impl SessionSettings {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, PvError> {
        let ttl = time::Duration::try_from(check_ttl(ttl)?)
            .map_err(|e| PvError::InvalidInput(format!("Invalid session lifetime: {e}")))?;

        // Signing keys must be 64 bytes; the secret itself may be any length.
        let digest = Sha512::digest(secret.as_ref());
        Ok(Self {
            key: Key::from(digest.as_slice()),
            ttl,
        })
    }
}

/// Session layer over an in-memory store.
pub fn session_manager(
    settings: &SessionSettings,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(settings.ttl))
        .with_signed(settings.key.clone())
}

/// The caller's session, with typed access to the user and flash notices.
#[derive(Clone)]
pub struct PvSession(Session);

impl<S> FromRequestParts<S> for PvSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(Self)
    }
}

impl PvSession {
    pub async fn user(&self) -> Result<Option<String>, PvError> {
        Ok(self.0.get(USER_KEY).await?)
    }

    /// Mark the session as authenticated. The id is rotated so a session id
    /// seen before login cannot be reused afterwards.
    pub async fn login(&self, username: &str) -> Result<(), PvError> {
        self.0.cycle_id().await?;
        self.0.insert(USER_KEY, username).await?;
        Ok(())
    }

    /// Forget the user. Safe to call on an anonymous session.
    pub async fn logout(&self) -> Result<(), PvError> {
        self.0.remove::<String>(USER_KEY).await?;
        Ok(())
    }

    pub async fn flash(
        &self,
        level: NoticeLevel,
        message: impl Into<String>,
    ) -> Result<(), PvError> {
        let mut notices: Vec<Notice> = self.0.get(NOTICES_KEY).await?.unwrap_or_default();
        notices.push(Notice {
            level,
            message: message.into(),
        });
        self.0.insert(NOTICES_KEY, notices).await?;
        Ok(())
    }

    /// Drain the queued notices.
    pub async fn take_notices(&self) -> Result<Vec<Notice>, PvError> {
        Ok(self
            .0
            .remove::<Vec<Notice>>(NOTICES_KEY)
            .await?
            .unwrap_or_default())
    }
}

/// Username of the caller, present only behind [`require_session`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Guard for admin routes: without a logged-in user, redirect to `/login`.
pub async fn require_session(session: PvSession, mut req: Request, next: Next) -> Response {
    match session.user().await {
        Ok(Some(username)) => {
            req.extensions_mut().insert(AuthenticatedUser(username));
            next.run(req).await
        }
        Ok(None) => {
            tracing::debug!(path = %req.uri().path(), "Unauthenticated access redirected");
            match session.flash(NoticeLevel::Error, "Please log in.").await {
                Ok(()) => Redirect::to("/login").into_response(),
                Err(e) => e.into_response(),
            }
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_still_yield_a_signing_key() {
        assert!(SessionSettings::new("", Duration::from_secs(60)).is_ok());
        assert!(SessionSettings::new("k", Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn lifetime_is_bounded() {
        assert!(check_ttl(Duration::from_secs(43200)).is_ok());
        assert!(check_ttl(MAX_SESSION_TTL).is_ok());
        assert!(matches!(
            check_ttl(Duration::ZERO),
            Err(PvError::InvalidInput(_))
        ));
        assert!(matches!(
            SessionSettings::new("k", Duration::from_secs(10_000_000_000_000)),
            Err(PvError::InvalidInput(_))
        ));
    }
}

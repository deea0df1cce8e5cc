//! Session authenticator.
//!
//! A session token is an opaque bearer credential. Resolution is a pure read:
//! it never extends, refreshes or deletes sessions. Expired sessions simply
//! stop resolving and can be swept later with
//! [`Store::purge_expired_sessions`].

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::auth::token::generate_token;
use crate::error::AppError;
use crate::models::{Session, User};
use crate::store::Store;

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Every session is valid for seven days from creation.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Attempts at drawing a token that is not already in use.
const MAX_TOKEN_ATTEMPTS: usize = 3;

pub fn session_ttl() -> Duration {
    Duration::days(SESSION_TTL_DAYS)
}

/// Resolves an optional token to the user who owns the session.
///
/// Returns `Ok(None)` (anonymous) when the token is absent, unknown or
/// expired at `now`. Store failures are returned unchanged.
pub async fn resolve_session<S: Store + ?Sized>(
    store: &S,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<User>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };

    let session = match store.get_session(token).await? {
        Some(session) => session,
        None => {
            debug!("Unknown session token");
            return Ok(None);
        }
    };

    if !session.is_active_at(now) {
        debug!("Session for user {} expired at {}", session.user_id, session.expires_at);
        return Ok(None);
    }

    let user = store.get_user(session.user_id).await?;
    if user.is_none() {
        warn!("Session references missing user {}", session.user_id);
    }
    Ok(user)
}

/// Like [`resolve_session`], but an anonymous caller is `AppError::Unauthorized`.
pub async fn require_user<S: Store + ?Sized>(
    store: &S,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    resolve_session(store, token, now)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))
}

/// Opens a new session for `user_id`, valid until `now + 7 days`.
///
/// Existing sessions of the same user are left alone.
pub async fn create_session<S: Store + ?Sized>(
    store: &S,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let mut attempt = 1;
    loop {
        let session = Session {
            token: generate_token(),
            user_id,
            created_at: now,
            expires_at: now + session_ttl(),
        };
        match store.create_session(session).await {
            Err(AppError::Conflict(_)) if attempt < MAX_TOKEN_ATTEMPTS => {
                warn!("Session token collision, drawing a new token");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Ends the session identified by `token`. Unknown tokens are ignored.
pub async fn destroy_session<S: Store + ?Sized>(store: &S, token: &str) -> Result<(), AppError> {
    store.delete_session(token).await
}

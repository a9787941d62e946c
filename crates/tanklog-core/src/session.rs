//! In-memory auth state and startup session restoration.
//!
//! `AuthState` is explicitly constructed and passed to callers rather than
//! living as a process-wide singleton, so tests can instantiate isolated
//! instances. Storage writes are awaited and their failures propagate.

use crate::auth::AuthUser;
use crate::error::Result;
use crate::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use crate::token::decode_claims;

/// Whether the user is logged in, exposed to the frontend for flow
/// selection (auth flow vs. authenticated flow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore an authenticated session from a user recovered at startup.
    pub fn restore_session(&mut self, user: AuthUser) {
        self.user = Some(user);
        self.is_authenticated = true;
        self.is_loading = false;
    }

    /// Record a fresh login and persist all three session keys.
    ///
    /// The state only flips to authenticated after every write succeeds.
    pub fn set_credentials<S: TokenStore>(
        &mut self,
        store: &S,
        user: AuthUser,
        token: &str,
        refresh_token: &str,
    ) -> Result<()> {
        store.save(ACCESS_TOKEN_KEY, token)?;
        store.save(REFRESH_TOKEN_KEY, refresh_token)?;
        store.save(USER_DATA_KEY, &serde_json::to_string(&user)?)?;

        self.user = Some(user);
        self.is_authenticated = true;
        self.error = None;
        Ok(())
    }

    /// Clear the in-memory session and the persisted keys.
    pub fn logout<S: TokenStore>(&mut self, store: &S) -> Result<()> {
        self.user = None;
        self.is_authenticated = false;
        self.error = None;
        store.clear_session()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Restore a persisted session at process start without contacting the
/// server.
///
/// Requires both the access token and the stored user object. The token
/// must have exactly three dot-separated parts and an unexpired `exp`
/// claim at `now` (epoch seconds); this is an unverified client-side check,
/// acceptable only because the server re-validates the token on every
/// protected call. Expired or malformed tokens clear all three stored keys
/// and leave the state unauthenticated.
pub fn restore_from_store<S: TokenStore>(
    store: &S,
    state: &mut AuthState,
    now: i64,
) -> Result<bool> {
    let token = store.load(ACCESS_TOKEN_KEY)?;
    let user_data = store.load(USER_DATA_KEY)?;

    if let (Some(token), Some(user_data)) = (token, user_data) {
        match decode_claims(&token) {
            Ok(claims) if !claims.is_expired(now) => {
                if let Ok(user) = serde_json::from_str::<AuthUser>(&user_data) {
                    tracing::info!(email = %user.email, "restoring persisted session");
                    state.restore_session(user);
                    return Ok(true);
                }
                tracing::warn!("stored user object is unreadable, clearing session");
            }
            Ok(_) => tracing::info!("persisted token expired, clearing session"),
            Err(error) => tracing::warn!(%error, "persisted token malformed, clearing session"),
        }
        store.clear_session()?;
    }

    state.set_loading(false);
    Ok(false)
}

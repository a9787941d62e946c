//! Auth endpoint client with secure session persistence.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::normalize_base_url;
use crate::error::{api_error, Error, Result};
use crate::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};

const AUTH_HTTP_TIMEOUT_SECS: u64 = 25;

/// Account identity returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub user_name: String,
}

/// An authenticated backend session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// HTTP client for the `/api/auth` endpoint group.
///
/// Successful login/register persist the session to the token store before
/// returning; logout clears it. Persistence failures propagate so callers
/// never observe a session state the store does not reflect.
#[derive(Clone)]
pub struct AuthClient<S: TokenStore> {
    auth_url: String,
    client: Client,
    store: S,
}

impl<S: TokenStore> AuthClient<S> {
    pub fn new(auth_url: impl AsRef<str>, store: S) -> Result<Self> {
        Ok(Self {
            auth_url: normalize_base_url(auth_url.as_ref())?,
            client: Client::builder()
                .timeout(Duration::from_secs(AUTH_HTTP_TIMEOUT_SECS))
                .build()?,
            store,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response: AuthResponse = self.post_json("/login", &payload).await?;
        let session = response.into_session();
        self.persist_session(&session)?;
        Ok(session)
    }

    pub async fn register(&self, email: &str, password: &str, user_name: &str) -> Result<AuthSession> {
        validate_credentials(email, password)?;
        if user_name.trim().is_empty() {
            return Err(Error::InvalidInput("User name is required".to_string()));
        }

        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "userName": user_name,
        });
        let response: AuthResponse = self.post_json("/register", &payload).await?;
        let session = response.into_session();
        self.persist_session(&session)?;
        Ok(session)
    }

    /// Exchange the refresh token for a new access token and persist it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        if refresh_token.trim().is_empty() {
            return Err(Error::InvalidInput("Refresh token must not be empty".to_string()));
        }

        let payload = serde_json::json!({ "refreshToken": refresh_token });
        let response: RefreshResponse = self.post_json("/refresh", &payload).await?;
        self.store.save(ACCESS_TOKEN_KEY, &response.token)?;
        Ok(response.token)
    }

    /// Notify the backend and clear the persisted session.
    ///
    /// The local session is cleared even when the backend call fails:
    /// logout must always work offline. Only storage failures propagate.
    pub async fn logout(&self) -> Result<()> {
        if let Err(error) = self.notify_backend_logout().await {
            tracing::warn!(%error, "backend logout failed, clearing local session anyway");
        }
        self.store.clear_session()
    }

    async fn notify_backend_logout(&self) -> Result<()> {
        let request = self.authorized(self.client.post(format!("{}/logout", self.auth_url)))?;
        let response = request.send().await?;
        let status = response.status();
        // A 401 means the token was already unusable; treat it as done.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status.as_u16(), &body))
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        if email.trim().is_empty() {
            return Err(Error::InvalidInput("Email is required".to_string()));
        }
        let payload = serde_json::json!({ "email": email });
        let response: MessageResponse = self.post_json("/forgot-password", &payload).await?;
        Ok(response.message)
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String> {
        if email.trim().is_empty() || otp.trim().is_empty() {
            return Err(Error::InvalidInput("Email and OTP are required".to_string()));
        }
        let payload = serde_json::json!({ "email": email, "otp": otp });
        let response: MessageResponse = self.post_json("/verify-otp", &payload).await?;
        Ok(response.message)
    }

    pub async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> Result<String> {
        if email.trim().is_empty() || otp.trim().is_empty() {
            return Err(Error::InvalidInput("Email and OTP are required".to_string()));
        }
        if new_password.trim().is_empty() {
            return Err(Error::InvalidInput("New password is required".to_string()));
        }
        let payload = serde_json::json!({
            "email": email,
            "otp": otp,
            "newPassword": new_password,
        });
        let response: MessageResponse = self.post_json("/reset-password", &payload).await?;
        Ok(response.message)
    }

    fn persist_session(&self, session: &AuthSession) -> Result<()> {
        self.store.save(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.store.save(REFRESH_TOKEN_KEY, &session.refresh_token)?;
        self.store
            .save(USER_DATA_KEY, &serde_json::to_string(&session.user)?)
    }

    /// Attach the stored bearer token when present; otherwise the request
    /// proceeds without the header and the server answers 401/403.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.store.access_token()? {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Ok(request),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        route: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let request = self.authorized(
            self.client
                .post(format!("{}{route}", self.auth_url))
                .header("Accept", "application/json")
                .json(payload),
        )?;

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(route, status = status.as_u16(), "auth request rejected");
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response.json::<T>().await?)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(Error::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    refresh_token: String,
    user: AuthUser,
}

impl AuthResponse {
    fn into_session(self) -> AuthSession {
        AuthSession {
            access_token: self.token,
            refresh_token: self.refresh_token,
            user: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTokenStore, SESSION_KEYS};
    use pretty_assertions::assert_eq;

    fn test_client() -> AuthClient<MemoryTokenStore> {
        AuthClient::new("http://localhost:8082/api/auth", MemoryTokenStore::new()).unwrap()
    }

    #[tokio::test]
    async fn logout_clears_local_session_when_backend_unreachable() {
        let store = MemoryTokenStore::new();
        for key in SESSION_KEYS {
            store.save(key, "stale").unwrap();
        }
        // Port 9 (discard) is unroutable for HTTP; the request fails at the
        // transport layer.
        let client = AuthClient::new("http://127.0.0.1:9/api/auth", store.clone()).unwrap();

        client.logout().await.unwrap();

        for key in SESSION_KEYS {
            assert_eq!(store.load(key).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn login_rejects_empty_credentials_before_any_network_call() {
        let client = test_client();
        assert!(client.login("", "secret").await.is_err());
        assert!(client.login("a@b.com", "  ").await.is_err());
    }

    #[tokio::test]
    async fn register_rejects_empty_user_name() {
        let client = test_client();
        assert!(client.register("a@b.com", "secret", " ").await.is_err());
    }

    #[tokio::test]
    async fn refresh_rejects_empty_token() {
        let client = test_client();
        assert!(client.refresh("").await.is_err());
    }

    #[test]
    fn persist_session_writes_all_three_keys() {
        let store = MemoryTokenStore::new();
        let client = AuthClient::new("http://localhost:8082/api/auth", store.clone()).unwrap();
        let session = AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user: AuthUser {
                id: 1,
                email: "a@b.com".to_string(),
                user_name: "a".to_string(),
            },
        };

        client.persist_session(&session).unwrap();
        assert_eq!(store.load(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("access"));
        assert_eq!(store.load(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh"));
        let user: AuthUser =
            serde_json::from_str(&store.load(USER_DATA_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(user.email, "a@b.com");
    }

    #[test]
    fn auth_response_parses_backend_wire_format() {
        let raw = r#"{
            "token": "access",
            "refreshToken": "refresh",
            "user": { "id": 1, "email": "a@b.com", "userName": "a" }
        }"#;
        let response: AuthResponse = serde_json::from_str(raw).unwrap();
        let session = response.into_session();
        assert_eq!(session.access_token, "access");
        assert_eq!(session.user.user_name, "a");
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            user: AuthUser {
                id: 1,
                email: "a@b.com".to_string(),
                user_name: "a".to_string(),
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

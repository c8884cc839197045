use reqwest::Method;
use serde::Serialize;

use crate::auth::token::TokenKind;
use crate::error::{PixshareError, Result};
use crate::http::{ApiClient, ApiRequest};

use super::models::{AuthResponse, AuthSession, User};

/// Login payload: either a username-or-email field or a plain email.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LoginCredentials {
    #[serde(rename_all = "camelCase")]
    UsernameOrEmail {
        username_or_email: String,
        password: String,
    },
    Email {
        email: String,
        password: String,
    },
}

impl LoginCredentials {
    pub fn username_or_email(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::UsernameOrEmail {
            username_or_email: login.into(),
            password: password.into(),
        }
    }

    pub fn email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Email {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Account endpoints under `/auth`.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and persist the returned tokens.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession> {
        self.authenticate("/auth/login", credentials, "Login failed")
            .await
    }

    /// Create an account and persist the returned tokens.
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession> {
        self.authenticate("/auth/register", registration, "Registration failed")
            .await
    }

    /// Profile of the logged-in user.
    pub async fn profile(&self) -> Result<User> {
        let response = self
            .client
            .get("/auth/profile")
            .await
            .map_err(|e| e.with_fallback("Failed to load profile"))?;
        response.json()
    }

    /// Forget both tokens locally.
    pub fn logout(&self) -> Result<()> {
        self.client.store().clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    async fn authenticate<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        fallback: &str,
    ) -> Result<AuthSession> {
        // A 401 here means bad credentials, not an expired access token.
        let request = ApiRequest::new(Method::POST, path).json(body)?.without_recovery();
        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| e.with_fallback(fallback))?;
        let session = response
            .json::<AuthResponse>()?
            .into_session()
            .ok_or_else(|| {
                PixshareError::Authentication(format!("{fallback}: response carried no access token"))
            })?;

        let store = self.client.store();
        store.set(TokenKind::Access, &session.tokens.access)?;
        match session.tokens.refresh.as_deref() {
            Some(refresh) => store.set(TokenKind::Refresh, refresh)?,
            None => store.remove(TokenKind::Refresh)?,
        }
        tracing::info!(
            username = session.user.as_ref().and_then(|u| u.username.as_deref()),
            "signed in"
        );
        Ok(session)
    }
}

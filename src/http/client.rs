//! Authenticated request pipeline.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::observer::RefreshObserver;
use crate::auth::store::TokenStore;
use crate::auth::token::TokenKind;
use crate::config::ClientConfig;
use crate::error::{PixshareError, Result};

use super::navigator::{is_auth_route, Navigator, NoopNavigator, LOGIN_ROUTE};
use super::refresh::{RefreshCoordinator, RefreshFailure, RefreshGuard, RefreshRole};
use super::request::{server_message, ApiRequest, ApiResponse, FormPart};

const REFRESH_PATH: &str = "/auth/refresh";

/// Error codes a refresh endpoint may put in its body to say the refresh
/// token itself is no good, whatever the status.
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "invalid_refresh_token",
    "refresh_token_expired",
    "refresh_token_revoked",
    "refresh_token_missing",
];

/// HTTP client that attaches the stored access token and recovers from
/// `401` with a single coordinated refresh.
///
/// Cloning is cheap; clones share the refresh coordinator, so a refresh
/// started through one clone is joined by requests from the others.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use pixshare::auth::{FileTokenStore, PersistingObserver};
/// use pixshare::config::ClientConfig;
/// use pixshare::http::ApiClient;
///
/// # async fn example() -> pixshare::error::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let store = Arc::new(FileTokenStore::new(config.token_store_config()));
/// let observer = Arc::new(PersistingObserver::new(store.clone()));
/// let client = ApiClient::new(&config, store, observer)?;
/// let response = client.get("/auth/profile").await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    refresh_http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    observer: Arc<dyn RefreshObserver>,
    navigator: Arc<dyn Navigator>,
    coordinator: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        observer: Arc<dyn RefreshObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let mut http = reqwest::Client::builder();
        let mut refresh_http = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            http = http.timeout(timeout);
            refresh_http = refresh_http.timeout(timeout);
        }
        Ok(Self {
            http: http.build()?,
            refresh_http: refresh_http.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            observer,
            navigator: Arc::new(NoopNavigator),
            coordinator: Arc::new(RefreshCoordinator::new()),
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::POST, path).json(body)?)
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::PUT, path).json(body)?)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }

    pub async fn post_multipart(&self, path: &str, parts: Vec<FormPart>) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::POST, path).multipart(parts))
            .await
    }

    /// Send `request`, recovering once from `401`.
    ///
    /// Non-2xx answers other than a recoverable `401` come back as
    /// [`PixshareError::Api`]; a failed refresh comes back as
    /// [`PixshareError::Refresh`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.execute(request).await
    }

    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse>> {
        async move {
            let token = match request.bearer.clone() {
                Some(token) => Some(token),
                None => self.store.get(TokenKind::Access)?,
            };
            let response = self.dispatch(&request, token.as_deref()).await?;
            if response.status() == StatusCode::UNAUTHORIZED && !request.is_retried() {
                return self.recover_unauthorized(request, token).await;
            }
            if !response.status().is_success() {
                return Err(response.into_error());
            }
            Ok(response)
        }
        .boxed()
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<ApiResponse> {
        let response = request
            .build(&self.http, &self.base_url, token)?
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(
            request_id = %request.id(),
            method = %request.method(),
            path = request.path(),
            status = status.as_u16(),
            retried = request.is_retried(),
            "api request completed"
        );
        Ok(ApiResponse::new(status, body))
    }

    async fn recover_unauthorized(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
    ) -> Result<ApiResponse> {
        // Someone else already replaced the token this request went out with.
        let current = self.store.get(TokenKind::Access)?;
        if let Some(current) = current.filter(|current| Some(current) != sent_with.as_ref()) {
            tracing::debug!(
                request_id = %request.id(),
                "access token changed since request was sent, replaying"
            );
            return self.execute(request.into_replay(current)).await;
        }

        match self.coordinator.begin_or_join(request) {
            RefreshRole::Leader { request, guard } => self.lead_refresh(request, guard).await,
            RefreshRole::Follower(rx) => match rx.await {
                Ok(Ok(replay)) => self.execute(replay).await,
                Ok(Err(failure)) => Err(PixshareError::Refresh(failure)),
                Err(_) => Err(PixshareError::Refresh(RefreshFailure::transient(
                    "token refresh was abandoned",
                ))),
            },
        }
    }

    async fn lead_refresh(
        &self,
        request: ApiRequest,
        mut guard: RefreshGuard<'_>,
    ) -> Result<ApiResponse> {
        tracing::debug!(request_id = %request.id(), "starting token refresh");
        match self.refresh_tokens().await {
            Ok((access, refresh)) => {
                tracing::info!("access token refreshed");
                self.observer.on_tokens_refreshed(&access, &refresh);
                guard.resolve(Ok(access.clone()));
                drop(guard);
                self.execute(request.into_replay(access)).await
            }
            Err(failure) => {
                tracing::warn!(
                    kind = ?failure.kind,
                    status = ?failure.status,
                    error = %failure.message,
                    "token refresh failed"
                );
                guard.resolve(Err(failure.clone()));
                if failure.is_credential() {
                    self.end_session();
                }
                drop(guard);
                Err(PixshareError::Refresh(failure))
            }
        }
    }

    /// POST the stored refresh token to the refresh endpoint on a client
    /// that never runs 401 recovery.
    async fn refresh_tokens(&self) -> std::result::Result<(String, String), RefreshFailure> {
        let refresh = match self.store.get(TokenKind::Refresh) {
            Ok(Some(token)) => token,
            Ok(None) => return Err(RefreshFailure::credential("no refresh token stored")),
            Err(e) => return Err(RefreshFailure::transient(e.to_string())),
        };

        let response = self
            .refresh_http
            .post(format!("{}{REFRESH_PATH}", self.base_url))
            .json(&json!({ "token": refresh }))
            .send()
            .await
            .map_err(|e| RefreshFailure::transient(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RefreshFailure::transient(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_refresh_rejection(status, &body));
        }

        let payload: RefreshResponse = serde_json::from_slice(&body)
            .map_err(|e| RefreshFailure::transient(format!("invalid refresh response: {e}")))?;
        let access = payload
            .access_token
            .or(payload.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RefreshFailure::transient("refresh response carried no access token")
                    .with_status(status.as_u16())
            })?;
        let refresh = payload
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or(refresh);
        Ok((access, refresh))
    }

    fn end_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear rejected credentials");
        }
        self.observer.on_session_cleared();
        let route = self.navigator.current_route();
        if !is_auth_route(&route) {
            tracing::info!(from = %route, "session ended, redirecting to login");
            self.navigator.navigate(LOGIN_ROUTE);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
    token: Option<String>,
    refresh_token: Option<String>,
}

fn classify_refresh_rejection(status: StatusCode, body: &[u8]) -> RefreshFailure {
    let message = server_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("refresh rejected")
            .to_string()
    });
    let credential = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || error_code(body).is_some_and(|code| {
            CREDENTIAL_ERROR_CODES
                .iter()
                .any(|known| known.eq_ignore_ascii_case(&code))
        });
    let failure = if credential {
        RefreshFailure::credential(message)
    } else {
        RefreshFailure::transient(message)
    };
    failure.with_status(status.as_u16())
}

fn error_code(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("code")?.as_str().map(str::to_string)
}

//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::auth::store::{StoreKeys, TokenStoreConfig, DEFAULT_ACCESS_KEY, DEFAULT_REFRESH_KEY};
use crate::error::PixshareError;

/// Default API origin plus the `/api` base path.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Settings for a [`crate::http::ApiClient`] and its token store.
///
/// # Example
/// ```
/// use pixshare::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://pix.example.com/api")
///     .build();
/// assert_eq!(config.keys.access, "auth_token");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default)]
    pub keys: StoreKeys,
    #[builder(default = TokenStoreConfig::default_dir())]
    pub token_dir: PathBuf,
    /// Per-request timeout applied to both the main and the refresh client.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables, after reading `.env` if present.
    ///
    /// `PIXSHARE_API_URL`, `PIXSHARE_AUTH_TOKEN_KEY`,
    /// `PIXSHARE_REFRESH_TOKEN_KEY`, `PIXSHARE_HOME`, `PIXSHARE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, PixshareError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PixshareError> {
        let mut config = Self::default();
        if let Some(url) = lookup("PIXSHARE_API_URL") {
            config.base_url = url;
        }
        config.keys = StoreKeys::new(
            lookup("PIXSHARE_AUTH_TOKEN_KEY").unwrap_or_else(|| DEFAULT_ACCESS_KEY.to_string()),
            lookup("PIXSHARE_REFRESH_TOKEN_KEY")
                .unwrap_or_else(|| DEFAULT_REFRESH_KEY.to_string()),
        );
        if let Some(dir) = lookup("PIXSHARE_HOME") {
            config.token_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("PIXSHARE_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PixshareError::Configuration(format!("PIXSHARE_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<(), PixshareError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PixshareError::Configuration(format!(
                "base URL must be absolute http(s): {url}"
            )));
        }
        if self.keys.access.is_empty() || self.keys.refresh.is_empty() {
            return Err(PixshareError::Configuration(
                "token keys must not be empty".to_string(),
            ));
        }
        if self.keys.access == self.keys.refresh {
            return Err(PixshareError::Configuration(
                "access and refresh tokens need distinct keys".to_string(),
            ));
        }
        Ok(())
    }

    pub fn token_store_config(&self) -> TokenStoreConfig {
        TokenStoreConfig::new(self.token_dir.clone()).with_keys(self.keys.clone())
    }
}

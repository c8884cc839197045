//! Process-start wiring of store, sweep, observer and pipeline.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::api::{AuthApi, CommentsApi, ImagesApi, LikesApi};
use crate::auth::claims::{self, Identity};
use crate::auth::observer::{PersistingObserver, RefreshObserver};
use crate::auth::store::{FileTokenStore, TokenStore};
use crate::auth::sweep::{sweep_expired_tokens, SweepOutcome};
use crate::auth::token::{TokenKind, TokenPair};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{ApiClient, Navigator};

/// A ready-to-use client.
///
/// Opening a session sweeps dead credentials before anything touches the
/// network, then registers the persisting observer with the pipeline.
pub struct Session {
    client: ApiClient,
    observer: Arc<PersistingObserver>,
    sweep: SweepOutcome,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("sweep", &self.sweep)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session backed by the token file under `config.token_dir`.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let store = Arc::new(FileTokenStore::new(config.token_store_config()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        config.validate()?;
        let sweep = sweep_expired_tokens(store.as_ref(), Utc::now());
        tracing::debug!(outcome = ?sweep, "startup token sweep finished");

        let observer = Arc::new(PersistingObserver::new(store.clone()));
        let hook: Arc<dyn RefreshObserver> = observer.clone();
        let client = ApiClient::new(config, store, hook)?;
        Ok(Self {
            client,
            observer,
            sweep,
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.client = self.client.with_navigator(navigator);
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn sweep_outcome(&self) -> SweepOutcome {
        self.sweep
    }

    /// Token pairs as they are refreshed or cleared.
    pub fn tokens(&self) -> watch::Receiver<Option<TokenPair>> {
        self.observer.subscribe()
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.client.store().get(TokenKind::Access)?.is_some())
    }

    /// Identity read from the stored access token. Informational only.
    pub fn identity(&self) -> Result<Option<Identity>> {
        Ok(self
            .client
            .store()
            .get(TokenKind::Access)?
            .and_then(|token| claims::identity(&token)))
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    pub fn images(&self) -> ImagesApi {
        ImagesApi::new(self.client.clone())
    }

    pub fn comments(&self) -> CommentsApi {
        CommentsApi::new(self.client.clone())
    }

    pub fn likes(&self) -> LikesApi {
        LikesApi::new(self.client.clone())
    }
}

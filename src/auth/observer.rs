use std::sync::Arc;

use tokio::sync::watch;

use super::store::TokenStore;
use super::token::TokenPair;

/// Receives the tokens produced by a successful refresh.
///
/// The request pipeline calls this synchronously before it replays any
/// request, so the store already holds the new pair when replays go out.
pub trait RefreshObserver: Send + Sync {
    fn on_tokens_refreshed(&self, access: &str, refresh: &str);

    /// Called after the pipeline dropped both tokens because the refresh
    /// token was rejected.
    fn on_session_cleared(&self) {}
}

/// Writes refreshed tokens through to a [`TokenStore`] and publishes them to
/// subscribers.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pixshare::auth::{MemoryTokenStore, PersistingObserver, RefreshObserver};
///
/// let observer = PersistingObserver::new(Arc::new(MemoryTokenStore::new()));
/// let rx = observer.subscribe();
/// observer.on_tokens_refreshed("a2", "r2");
/// assert_eq!(rx.borrow().as_ref().map(|p| p.access.as_str()), Some("a2"));
/// ```
pub struct PersistingObserver {
    store: Arc<dyn TokenStore>,
    tx: watch::Sender<Option<TokenPair>>,
}

impl PersistingObserver {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let current = store.pair().ok().flatten();
        let (tx, _rx) = watch::channel(current);
        Self { store, tx }
    }

    /// Watch the latest token pair. Starts with the pair loaded at construction.
    pub fn subscribe(&self) -> watch::Receiver<Option<TokenPair>> {
        self.tx.subscribe()
    }
}

impl RefreshObserver for PersistingObserver {
    fn on_tokens_refreshed(&self, access: &str, refresh: &str) {
        let pair = TokenPair::new(access, Some(refresh.to_string()));
        if let Err(e) = self.store.save_pair(&pair) {
            tracing::warn!(error = %e, "failed to persist refreshed tokens");
        }
        self.tx.send_replace(Some(pair));
    }

    fn on_session_cleared(&self) {
        self.tx.send_replace(None);
    }
}

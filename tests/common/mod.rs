//! Shared test helpers: client wiring against a mock server and fake tokens.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pixshare::auth::{MemoryTokenStore, PersistingObserver, RefreshObserver, TokenKind, TokenStore};
use pixshare::config::ClientConfig;
use pixshare::http::{ApiClient, Navigator};
use serde_json::Value;
use wiremock::MockServer;

/// Unsigned token with `payload` as its claims segment.
pub fn jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(format!("{}/api", server.uri()))
        .build()
}

/// Observer that persists like the default one and counts its calls.
pub struct CountingObserver {
    inner: PersistingObserver,
    pub refreshed: AtomicUsize,
    pub cleared: AtomicUsize,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl CountingObserver {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: PersistingObserver::new(store),
            refreshed: AtomicUsize::new(0),
            cleared: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshed.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl RefreshObserver for CountingObserver {
    fn on_tokens_refreshed(&self, access: &str, refresh: &str) {
        self.refreshed.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((access.to_string(), refresh.to_string()));
        self.inner.on_tokens_refreshed(access, refresh);
    }

    fn on_session_cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        self.inner.on_session_cleared();
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub store: Arc<MemoryTokenStore>,
    pub observer: Arc<CountingObserver>,
}

impl Harness {
    pub fn new(server: &MockServer, access: Option<&str>, refresh: Option<&str>) -> Self {
        Self::with_config(config(server), access, refresh)
    }

    pub fn with_config(config: ClientConfig, access: Option<&str>, refresh: Option<&str>) -> Self {
        let store = Arc::new(match access {
            Some(access) => MemoryTokenStore::with_tokens(access, refresh),
            None => MemoryTokenStore::new(),
        });
        let observer = Arc::new(CountingObserver::new(store.clone()));
        let client = ApiClient::new(&config, store.clone(), observer.clone()).unwrap();
        Self {
            client,
            store,
            observer,
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.client = self.client.with_navigator(navigator);
        self
    }

    pub fn access(&self) -> Option<String> {
        self.store.get(TokenKind::Access).unwrap()
    }

    pub fn refresh(&self) -> Option<String> {
        self.store.get(TokenKind::Refresh).unwrap()
    }
}

/// Timeout short enough to turn a delayed mock into a transport failure.
pub fn short_timeout(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(format!("{}/api", server.uri()))
        .timeout(Duration::from_millis(300))
        .build()
}

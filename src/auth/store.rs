use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;
use super::token::{TokenKind, TokenPair};

/// Default persistence key of the access token.
pub const DEFAULT_ACCESS_KEY: &str = "auth_token";
/// Default persistence key of the refresh token.
pub const DEFAULT_REFRESH_KEY: &str = "refresh_token";

const TOKEN_FILE_NAME: &str = "tokens.toml";
const TOKEN_FILE_VERSION: u32 = 1;

/// Storage abstraction for the persisted access/refresh tokens.
///
/// Implementations only persist; they never validate token content.
/// Writes are last-writer-wins.
pub trait TokenStore: Send + Sync {
    fn get(&self, kind: TokenKind) -> Result<Option<String>, AuthError>;
    /// Overwrite the persisted value. An empty token removes the key instead.
    fn set(&self, kind: TokenKind, token: &str) -> Result<(), AuthError>;
    fn remove(&self, kind: TokenKind) -> Result<(), AuthError>;

    /// Load the current pair, if an access token is present.
    fn pair(&self) -> Result<Option<TokenPair>, AuthError> {
        let Some(access) = self.get(TokenKind::Access)? else {
            return Ok(None);
        };
        Ok(Some(TokenPair::new(access, self.get(TokenKind::Refresh)?)))
    }

    /// Persist a pair. A pair without refresh token leaves the stored one alone.
    fn save_pair(&self, pair: &TokenPair) -> Result<(), AuthError> {
        self.set(TokenKind::Access, &pair.access)?;
        if let Some(refresh) = pair.refresh.as_deref() {
            self.set(TokenKind::Refresh, refresh)?;
        }
        Ok(())
    }

    /// Remove both tokens.
    fn clear(&self) -> Result<(), AuthError> {
        self.remove(TokenKind::Access)?;
        self.remove(TokenKind::Refresh)
    }
}

/// Persistence key names for both token kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub access: String,
    pub refresh: String,
}

impl StoreKeys {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn key(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_KEY, DEFAULT_REFRESH_KEY)
    }
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
    pub keys: StoreKeys,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            keys: StoreKeys::default(),
        }
    }

    pub fn with_keys(mut self, keys: StoreKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn default_dir() -> PathBuf {
        default_pixshare_dir()
    }
}

/// File-backed token store: one TOML file holding both keys.
///
/// # Example
/// ```no_run
/// use pixshare::auth::{FileTokenStore, TokenKind, TokenStore, TokenStoreConfig};
///
/// let store = FileTokenStore::new(TokenStoreConfig::new("/tmp/pixshare".into()));
/// store.set(TokenKind::Access, "eyJ...")?;
/// assert!(store.get(TokenKind::Access)?.is_some());
/// # Ok::<(), pixshare::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    keys: StoreKeys,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            path: config.base_dir.join(TOKEN_FILE_NAME),
            keys: config.keys,
            write_lock: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(TokenStoreConfig::new(default_pixshare_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Option<TokenFile>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        Ok(Some(toml::from_str(&raw)?))
    }

    fn write_file(&self, tokens: BTreeMap<String, String>) -> Result<(), AuthError> {
        if tokens.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Io(err.to_string())),
            };
        }
        let file = TokenFile {
            version: TOKEN_FILE_VERSION,
            saved_at: Utc::now(),
            tokens,
        };
        atomic_write(&self.path, toml::to_string(&file)?.as_bytes())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Io("token file lock poisoned".to_string()))?;
        let mut tokens = self.read_file()?.map(|f| f.tokens).unwrap_or_default();
        apply(&mut tokens);
        self.write_file(tokens)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>, AuthError> {
        let Some(file) = self.read_file()? else {
            return Ok(None);
        };
        Ok(file
            .tokens
            .get(self.keys.key(kind))
            .filter(|v| !v.is_empty())
            .cloned())
    }

    fn set(&self, kind: TokenKind, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return self.remove(kind);
        }
        let key = self.keys.key(kind).to_string();
        self.update(|tokens| {
            tokens.insert(key, token.to_string());
        })
    }

    fn remove(&self, kind: TokenKind) -> Result<(), AuthError> {
        let key = self.keys.key(kind);
        self.update(|tokens| {
            tokens.remove(key);
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    saved_at: DateTime<Utc>,
    tokens: BTreeMap<String, String>,
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store already holding the given tokens.
    pub fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        let mut tokens = HashMap::new();
        if !access.is_empty() {
            tokens.insert(TokenKind::Access, access.to_string());
        }
        if let Some(refresh) = refresh.filter(|r| !r.is_empty()) {
            tokens.insert(TokenKind::Refresh, refresh.to_string());
        }
        Self {
            tokens: Mutex::new(tokens),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<TokenKind, String>>, AuthError> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::Io("token store lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>, AuthError> {
        Ok(self.lock()?.get(&kind).cloned())
    }

    fn set(&self, kind: TokenKind, token: &str) -> Result<(), AuthError> {
        let mut tokens = self.lock()?;
        if token.is_empty() {
            tokens.remove(&kind);
        } else {
            tokens.insert(kind, token.to_string());
        }
        Ok(())
    }

    fn remove(&self, kind: TokenKind) -> Result<(), AuthError> {
        self.lock()?.remove(&kind);
        Ok(())
    }
}

/// Readers see either the previous file or the new one, never a partial write.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| AuthError::Io(format!("token path {} has no file name", path.display())))?;
    let temp_path = path.with_file_name(format!(
        ".{}.tmp-{}",
        file_name.to_string_lossy(),
        Uuid::new_v4().simple()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let written = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}

fn default_pixshare_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".pixshare"))
        .unwrap_or_else(|| PathBuf::from(".pixshare"))
}

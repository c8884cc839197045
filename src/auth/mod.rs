//! Token persistence, inspection and the startup sweep.

pub mod claims;
pub mod error;
pub mod observer;
pub mod store;
pub mod sweep;
pub mod token;

pub use claims::{Claims, Identity, RecordId};
pub use error::AuthError;
pub use observer::{PersistingObserver, RefreshObserver};
pub use store::{FileTokenStore, MemoryTokenStore, StoreKeys, TokenStore, TokenStoreConfig};
pub use sweep::{sweep_expired_tokens, SweepOutcome};
pub use token::{TokenKind, TokenPair};

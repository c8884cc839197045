//! Convenience re-exports for common use.

pub use crate::api::{
    AuthApi, AuthSession, Comment, CommentsApi, Image, ImagePage, ImagesApi, LikeState, LikesApi,
    LoginCredentials, Registration, Upload, User,
};
pub use crate::auth::{
    FileTokenStore, Identity, MemoryTokenStore, PersistingObserver, RecordId, RefreshObserver,
    TokenKind, TokenPair, TokenStore,
};
pub use crate::config::ClientConfig;
pub use crate::error::{PixshareError, Result};
pub use crate::http::{ApiClient, ApiRequest, ApiResponse, Navigator, RefreshFailure};
pub use crate::session::Session;

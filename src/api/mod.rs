//! Typed wrappers over the image-sharing endpoints.
//!
//! Every call goes through [`crate::http::ApiClient`], so all of them share
//! one token refresh. Failures without a server message get a per-operation
//! fallback text.

pub mod auth;
pub mod comments;
pub mod images;
pub mod likes;
pub mod models;

pub use auth::{AuthApi, LoginCredentials, Registration};
pub use comments::CommentsApi;
pub use images::{ImagesApi, Upload, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use likes::LikesApi;
pub use models::{AuthSession, Comment, Image, ImagePage, LikeState, User};

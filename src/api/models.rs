//! Records exchanged with the image-sharing API.
//!
//! Deserialization is lenient: unknown fields are ignored (or kept in
//! `extra`), ids may arrive as `id` or `_id`, numbers or strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::claims::RecordId;
use crate::auth::token::TokenPair;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: Option<RecordId>,
    #[serde(alias = "userName")]
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default, alias = "imageUrl", alias = "path")]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "originalName", alias = "fileName")]
    pub filename: Option<String>,
    #[serde(default, alias = "owner")]
    pub user: Option<User>,
    #[serde(default, alias = "likesCount")]
    pub likes: Option<u64>,
    #[serde(default, alias = "isLiked")]
    pub liked: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default, alias = "content")]
    pub text: String,
    #[serde(default, alias = "author")]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Like status of an image after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LikeState {
    #[serde(alias = "isLiked")]
    pub liked: bool,
    #[serde(alias = "likesCount", alias = "count")]
    pub likes: u64,
}

/// One page of a gallery listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePage {
    pub images: Vec<Image>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl ImagePage {
    /// Normalize the listing shapes the server uses.
    ///
    /// Images come from `images` or `data`; counters are read top-level first
    /// and then from a nested `pagination` object. Zero counts as missing.
    /// Without a page count it is derived from `total` and `limit`.
    pub fn from_response(raw: RawImagePage, limit: u32) -> Self {
        let nested = raw.pagination.unwrap_or_default();
        let total = first_positive(&[raw.total, nested.total]).unwrap_or(0);
        let total_pages = first_positive(&[raw.total_pages, nested.total_pages])
            .unwrap_or_else(|| total.div_ceil(u64::from(limit.max(1))));
        let current_page = first_positive(&[raw.current_page, nested.current_page]).unwrap_or(1);
        Self {
            images: raw.images.or(raw.data).unwrap_or_default(),
            total,
            total_pages,
            current_page,
        }
    }
}

fn first_positive(candidates: &[Option<u64>]) -> Option<u64> {
    candidates.iter().flatten().copied().find(|v| *v > 0)
}

/// Listing as sent by the server, before normalization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawImagePage {
    images: Option<Vec<Image>>,
    data: Option<Vec<Image>>,
    total: Option<u64>,
    total_pages: Option<u64>,
    current_page: Option<u64>,
    pagination: Option<RawPagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPagination {
    total: Option<u64>,
    total_pages: Option<u64>,
    current_page: Option<u64>,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: Option<User>,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AuthResponse {
    pub(crate) fn into_session(self) -> Option<AuthSession> {
        let access = self
            .access_token
            .or(self.token)
            .filter(|t| !t.is_empty())?;
        let refresh = self.refresh_token.filter(|t| !t.is_empty());
        Some(AuthSession {
            user: self.user,
            tokens: TokenPair::new(access, refresh),
        })
    }
}

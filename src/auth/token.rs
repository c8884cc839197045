use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which of the two persisted credentials a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The active access/refresh pair of a client instance.
///
/// Tokens are never mutated in place; a refresh produces a new pair.
///
/// # Example
/// ```
/// use pixshare::auth::TokenPair;
///
/// let pair = TokenPair::new("access", Some("refresh".to_string()));
/// assert_eq!(pair.access, "access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.into(),
            refresh,
        }
    }
}


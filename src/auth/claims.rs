//! Unverified inspection of compact `header.payload.signature` tokens.
//!
//! Nothing here checks a signature. Claims are informational (display name,
//! expiry hints) and must never gate anything the server does not enforce
//! itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `exp` claim in seconds since the epoch.
    pub fn exp(&self) -> Option<i64> {
        let exp = self.0.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp()?, 0).single()
    }

    /// Identity claims; see [`identity`].
    pub fn identity(&self) -> Identity {
        let id = ["userId", "userID", "subId"]
            .iter()
            .filter_map(|name| self.0.get(*name))
            .find(|v| !v.is_null())
            .and_then(RecordId::from_value);
        let username = ["sub", "username", "userName"]
            .iter()
            .filter_map(|name| self.0.get(*name))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_string);
        Identity { id, username }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Identifier as the server sends it: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// The id escaped for use as a single URL path segment.
    pub fn path_segment(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => utf8_percent_encode(s, PATH_SEGMENT).to_string(),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    /// Numeric strings become [`RecordId::Number`].
    fn from(value: &str) -> Self {
        value
            .parse::<i64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(value.to_string()))
    }
}

/// Who a token says it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub id: Option<RecordId>,
    pub username: Option<String>,
}

/// Decode the payload segment of `token` without verifying it.
///
/// Returns `None` for anything malformed; the cause is logged, never raised.
pub fn decode(token: &str) -> Option<Claims> {
    let Some(segment) = token.split('.').nth(1).filter(|s| !s.is_empty()) else {
        tracing::warn!("token has no payload segment");
        return None;
    };
    let mut normalized = segment.replace('-', "+").replace('_', "/");
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    let bytes = match STANDARD.decode(normalized.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode token payload");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(Claims(map)),
        Ok(_) => {
            tracing::warn!("token payload is not a JSON object");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse token payload");
            None
        }
    }
}

/// Identity carried by `token`, or `None` when it cannot be decoded.
pub fn identity(token: &str) -> Option<Identity> {
    decode(token).map(|claims| claims.identity())
}

/// Expiry of `token`, or `None` when undecodable or without `exp`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode(token)?.expires_at()
}

/// Whether `token` expired strictly before `now`. `None` when unknown.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> Option<bool> {
    expires_at(token).map(|exp| exp < now)
}

#[cfg(test)]
pub(crate) fn encode_for_test(payload: &Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

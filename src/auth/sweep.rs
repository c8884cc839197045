//! Startup removal of credentials that are visibly dead.

use chrono::{DateTime, Utc};

use super::claims;
use super::store::TokenStore;
use super::token::TokenKind;

/// What [`sweep_expired_tokens`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// One or both tokens were absent.
    NoTokens,
    /// Access token still valid, or refresh token still able to renew it.
    Kept,
    /// Both tokens had expired and were removed.
    Cleared,
    /// An expiry could not be read; tokens were left in place.
    Undecidable,
}

/// Run once before any network activity.
///
/// Removes both tokens only when the access token *and* the refresh token
/// are past their `exp`. Anything it cannot decide leaves the store as is;
/// the request pipeline handles every other expiry case. Never fails.
pub fn sweep_expired_tokens(store: &dyn TokenStore, now: DateTime<Utc>) -> SweepOutcome {
    let (access, refresh) = match (store.get(TokenKind::Access), store.get(TokenKind::Refresh)) {
        (Ok(Some(access)), Ok(Some(refresh))) => (access, refresh),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "token sweep could not read the store");
            return SweepOutcome::Undecidable;
        }
        _ => return SweepOutcome::NoTokens,
    };

    let Some(access_expired) = claims::is_expired(&access, now) else {
        tracing::debug!("access token expiry unreadable, skipping sweep");
        return SweepOutcome::Undecidable;
    };
    if !access_expired {
        return SweepOutcome::Kept;
    }

    let Some(refresh_expired) = claims::is_expired(&refresh, now) else {
        tracing::debug!("refresh token expiry unreadable, skipping sweep");
        return SweepOutcome::Undecidable;
    };
    if !refresh_expired {
        return SweepOutcome::Kept;
    }

    if let Err(e) = store.clear() {
        tracing::warn!(error = %e, "failed to remove expired tokens");
        return SweepOutcome::Undecidable;
    }
    tracing::info!("removed expired access and refresh tokens");
    SweepOutcome::Cleared
}

//! Bearer token liveness.
//!
//! Bootstrap checks only the locally embedded `exp` claim of the JWT
//! payload; there is no signature verification and no network call.
//! The backend remains free to reject a token the client thought was
//! live.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    /// Seconds since the Unix epoch.
    exp: i64,
}

/// Whether `token` is live at `now`.
///
/// A token whose `exp` claim cannot be extracted is treated as
/// expired, so a malformed token purges its scope like a stale one.
pub(crate) fn is_live(token: &str, now: DateTime<Utc>) -> bool {
    expiry(token).is_some_and(|exp| exp > now)
}

/// Extract the expiry claim from a JWT payload without verification.
fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let claims: ExpiryClaims = serde_json::from_slice(&bytes).ok()?;
    Utc.timestamp_opt(claims.exp, 0).single()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn token_with_exp(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    #[test]
    fn test_future_expiry_is_live() {
        let now = Utc::now();
        let token = token_with_exp((now + TimeDelta::hours(1)).timestamp());
        assert!(is_live(&token, now));
    }

    #[test]
    fn test_past_expiry_is_dead() {
        let now = Utc::now();
        let token = token_with_exp((now - TimeDelta::hours(1)).timestamp());
        assert!(!is_live(&token, now));
    }

    #[test]
    fn test_missing_exp_claim_is_dead() {
        let payload = URL_SAFE_NO_PAD.encode("{\"sub\":\"1\"}");
        let token = format!("header.{payload}.sig");
        assert!(!is_live(&token, Utc::now()));
    }

    #[test]
    fn test_malformed_token_is_dead() {
        assert!(!is_live("not-a-jwt", Utc::now()));
        assert!(!is_live("a.%%%.c", Utc::now()));
        assert!(!is_live("", Utc::now()));
    }
}

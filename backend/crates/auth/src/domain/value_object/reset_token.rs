//! Password Reset Token Value Object
//!
//! Ephemeral single-use credential: 128 random bits, hex-encoded, valid
//! for one hour from issuance. Cleared on successful reset, superseded
//! by re-issuance.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{constant_time_eq, random_bytes, to_hex};

/// Token validity window in milliseconds (1 hour)
pub const RESET_TOKEN_TTL_MS: i64 = 3_600_000;

/// Password reset token with its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Mint a fresh token expiring one hour from now
    pub fn issue() -> Self {
        Self::issue_at(Utc::now())
    }

    /// Mint a fresh token with an explicit issuance instant
    pub fn issue_at(now: DateTime<Utc>) -> Self {
        Self {
            token: to_hex(&random_bytes(16)),
            expires_at: now + Duration::milliseconds(RESET_TOKEN_TTL_MS),
        }
    }

    /// Rehydrate from stored columns
    pub fn from_parts(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Constant-time candidate comparison
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.token.as_bytes(), candidate.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_128_bit_hex() {
        let token = ResetToken::issue();
        assert_eq!(token.as_str().len(), 32);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_expiry_is_exactly_one_hour() {
        let now = Utc::now();
        let token = ResetToken::issue_at(now);
        assert_eq!(
            (token.expires_at() - now).num_milliseconds(),
            RESET_TOKEN_TTL_MS
        );
    }

    #[test]
    fn test_reissue_supersedes() {
        let a = ResetToken::issue();
        let b = ResetToken::issue();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_expiry_check() {
        let now = Utc::now();
        let token = ResetToken::issue_at(now);
        assert!(!token.is_expired_at(now));
        assert!(!token.is_expired_at(now + Duration::minutes(59)));
        assert!(token.is_expired_at(now + Duration::minutes(60)));
    }

    #[test]
    fn test_matches() {
        let token = ResetToken::issue();
        let same = token.as_str().to_string();
        assert!(token.matches(&same));
        assert!(!token.matches("deadbeefdeadbeefdeadbeefdeadbeef"));
        assert!(!token.matches(""));
    }
}

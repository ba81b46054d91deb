//! Gravatar URL Derivation
//!
//! Derives an avatar URL from an email address using the SHA-256 scheme.
//! The email is normalized (trimmed, lowercased) before hashing, per the
//! gravatar.com contract.

use crate::crypto::{sha256, to_hex};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

/// Build the gravatar URL for an email address.
///
/// An empty email yields the URL of the default avatar.
pub fn url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let hash = to_hex(&sha256(normalized.as_bytes()));
    format!("{}{}", GRAVATAR_BASE, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_hashes_normalized_email() {
        // Normalization: whitespace and case must not change the hash
        let a = url("User@Example.com ");
        let b = url("user@example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn test_url_shape() {
        let u = url("someone@example.com");
        assert!(u.starts_with(GRAVATAR_BASE));
        // SHA-256 hex is 64 chars
        assert_eq!(u.len(), GRAVATAR_BASE.len() + 64);
    }

    #[test]
    fn test_known_hash() {
        // sha256("hello") as a fixed reference point
        let u = url("hello");
        assert!(u.ends_with("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"));
    }
}

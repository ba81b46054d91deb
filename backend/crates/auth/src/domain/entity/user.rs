//! User Entity
//!
//! Identity record with credentials, 2FA enrollment, reset-token state,
//! and lifecycle. Role and account memberships are read through the
//! store's link tables and carried here as id lists.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{
    lifecycle::Lifecycle, reset_token::ResetToken, totp_secret::TotpSecret, user_id::UserId,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Immutable identifier, assigned at creation
    pub user_id: UserId,
    /// Login/display name
    pub username: String,
    /// Email address, may be empty
    pub email: String,
    /// Hashed password (PHC string)
    pub password_hash: HashedPassword,
    /// Disabled users cannot log in regardless of credentials
    pub enabled: bool,
    /// TOTP secret, present once 2FA enrollment has happened
    pub totp_secret: Option<TotpSecret>,
    /// Outstanding password-reset token
    pub reset_token: Option<ResetToken>,
    /// Active or soft-deleted
    pub lifecycle: Lifecycle,
    /// Assigned role ids
    pub role_ids: Vec<i64>,
    /// Linked account ids
    pub account_ids: Vec<i64>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new enabled, active user
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: HashedPassword,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            enabled: true,
            totp_secret: None,
            reset_token: None,
            lifecycle: Lifecycle::Active,
            role_ids: Vec::new(),
            account_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if login is allowed
    pub fn can_login(&self) -> bool {
        self.enabled && self.lifecycle.is_active()
    }

    /// Turn a soft-deleted record back to active
    pub fn reactivate(&mut self) {
        self.lifecycle.restore();
        self.enabled = true;
        self.touch();
    }

    /// Soft-delete: set the delete marker and clear the enabled flag
    pub fn soft_delete(&mut self) {
        self.lifecycle.delete();
        self.enabled = false;
        self.touch();
    }

    /// Persist a provisioned TOTP secret
    pub fn enroll_totp(&mut self, secret: TotpSecret) {
        self.totp_secret = Some(secret);
        self.touch();
    }

    /// Mint and attach a fresh reset token, superseding any prior one
    pub fn issue_reset(&mut self) -> ResetToken {
        let token = ResetToken::issue();
        self.reset_token = Some(token.clone());
        self.touch();
        token
    }

    /// Consume the reset token
    pub fn clear_reset(&mut self) {
        self.reset_token = None;
        self.touch();
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn test_user() -> User {
        let hash = ClearTextPassword::new("hunter2hunter2".to_string())
            .unwrap()
            .hash()
            .unwrap();
        User::new("alice", "alice@example.com", hash)
    }

    #[test]
    fn test_new_user_is_enabled_and_active() {
        let user = test_user();
        assert!(user.enabled);
        assert!(user.lifecycle.is_active());
        assert!(user.can_login());
        assert!(user.totp_secret.is_none());
        assert!(user.reset_token.is_none());
    }

    #[test]
    fn test_soft_delete_blocks_login() {
        let mut user = test_user();
        user.soft_delete();
        assert!(!user.enabled);
        assert!(user.lifecycle.is_deleted());
        assert!(!user.can_login());
    }

    #[test]
    fn test_reactivate_keeps_id() {
        let mut user = test_user();
        let id = user.user_id;
        user.soft_delete();
        user.reactivate();
        assert_eq!(user.user_id, id);
        assert!(user.enabled);
        assert!(user.lifecycle.is_active());
    }

    #[test]
    fn test_disabled_user_cannot_login() {
        let mut user = test_user();
        user.enabled = false;
        assert!(!user.can_login());
    }

    #[test]
    fn test_issue_and_clear_reset() {
        let mut user = test_user();
        let token = user.issue_reset();
        assert_eq!(user.reset_token.as_ref().unwrap().as_str(), token.as_str());

        let superseded = user.issue_reset();
        assert_ne!(superseded.as_str(), token.as_str());

        user.clear_reset();
        assert!(user.reset_token.is_none());
    }
}

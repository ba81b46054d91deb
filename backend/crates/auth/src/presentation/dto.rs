//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::entity::{role::Role, user::User};
use crate::infra::provider::TokenGrant;

// ============================================================================
// Public User View
// ============================================================================

/// Redacted user projection safe for external exposure.
///
/// Never carries the password hash or the TOTP secret. The token/expired
/// pair is present only when produced by a token-issuing flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub gravatar: String,
    pub email: String,
    pub enabled: bool,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub roles: Vec<i64>,
    pub accounts: Vec<i64>,
}

impl PublicUser {
    /// Project a user without token material
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            username: user.username.clone(),
            gravatar: platform::gravatar::url(&user.email),
            email: user.email.clone(),
            enabled: user.enabled,
            removed: user.lifecycle.is_deleted(),
            expired: None,
            token: None,
            roles: user.role_ids.clone(),
            accounts: user.account_ids.clone(),
        }
    }

    /// Project a user with the live token pair attached
    pub fn with_token(user: &User, token: String, expires: i64) -> Self {
        Self {
            expired: Some(expires),
            token: Some(token),
            ..Self::from_user(user)
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

/// Two-factor request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga2faRequest {
    pub id: Option<String>,
    pub code: Option<String>,
}

/// Forgot-password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotRequest {
    #[serde(default)]
    pub email: String,
}

/// Password-reset request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(default)]
    pub password: String,
}

/// Logout request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub id: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Liveness response
#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub ping: &'static str,
}

/// `{ user }` envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEnvelope {
    pub user: PublicUser,
}

/// Advisory/diagnostic message with a success status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

/// Forgot-password response: user plus the raw token for delivery
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Two-factor enrollment payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga2faEnrollResponse {
    /// QR code as base64-encoded PNG
    pub qr: String,
    /// Secret for manual entry
    pub secret: String,
}

/// Two-factor verification result with token data
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga2faVerifiedResponse {
    pub status: &'static str,
    pub data: TokenGrant,
}

// ============================================================================
// Roles
// ============================================================================

/// Role representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub enabled: bool,
    pub removed: bool,
    /// Member user ids
    pub users: Vec<String>,
}

impl RoleDto {
    pub fn from_role(role: &Role) -> Self {
        Self {
            id: role.role_id,
            title: role.title.clone(),
            description: role.description.clone(),
            enabled: role.enabled,
            removed: role.lifecycle.is_deleted(),
            users: role.member_ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Role creation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Role update request: fields plus the full replacement membership set
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateRequest {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub users: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn sample_user() -> User {
        let hash = ClearTextPassword::new("correct-horse-battery".to_string())
            .unwrap()
            .hash()
            .unwrap();
        User::new("alice", "alice@example.com", hash)
    }

    #[test]
    fn test_public_user_is_redacted() {
        let view = PublicUser::from_user(&sample_user());
        let json = serde_json::to_value(&view).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();

        assert!(!keys.contains(&"password"));
        assert!(!keys.contains(&"passwordHash"));
        assert!(!keys.contains(&"totpSecret"));
        assert!(keys.contains(&"gravatar"));
    }

    #[test]
    fn test_token_pair_only_when_issued() {
        let user = sample_user();

        let plain = serde_json::to_value(PublicUser::from_user(&user)).unwrap();
        assert!(plain.get("token").is_none());
        assert!(plain.get("expired").is_none());

        let with_token =
            serde_json::to_value(PublicUser::with_token(&user, "abc".into(), 42)).unwrap();
        assert_eq!(with_token["token"], "abc");
        assert_eq!(with_token["expired"], 42);
    }

    #[test]
    fn test_removed_flag_tracks_lifecycle() {
        let mut user = sample_user();
        assert!(!PublicUser::from_user(&user).removed);
        user.soft_delete();
        assert!(PublicUser::from_user(&user).removed);
    }
}

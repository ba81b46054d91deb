//! Store Traits
//!
//! Persistence contract for users and roles. Implementation is in the
//! infrastructure layer.

use crate::domain::entity::{role::Role, user::User};
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

/// User store trait
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by username, regardless of lifecycle
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by email, regardless of lifecycle
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Find user holding the given reset token
    async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Physically delete a user (test configuration only)
    async fn hard_delete(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Role store trait
#[trait_variant::make(RoleStore: Send)]
pub trait LocalRoleStore {
    /// Insert a new role; the store assigns the id
    async fn insert(&self, role: &Role) -> AuthResult<()>;

    /// Find role by id, with aggregated membership
    async fn find_by_id(&self, role_id: i64) -> AuthResult<Option<Role>>;

    /// Find role by title, with aggregated membership
    async fn find_by_title(&self, title: &str) -> AuthResult<Option<Role>>;

    /// All roles ordered by id ascending, optionally filtered by enabled
    async fn list(&self, enabled: Option<bool>) -> AuthResult<Vec<Role>>;

    /// Update title/description/enabled/removed fields, not membership
    async fn update_fields(&self, role: &Role) -> AuthResult<()>;

    /// Delete every membership link of a role
    async fn delete_links(&self, role_id: i64) -> AuthResult<()>;

    /// Insert membership links for a role
    async fn insert_links(&self, role_id: i64, members: &[UserId]) -> AuthResult<()>;

    /// Physically delete a role (test configuration only)
    async fn hard_delete(&self, role_id: i64) -> AuthResult<()>;
}

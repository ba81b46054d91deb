//! Role Entity
//!
//! Roles gate access to protected resources. Three system roles carry
//! fixed, well-known ids and can never be disabled or deleted.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{lifecycle::Lifecycle, user_id::UserId};

/// Fixed id of the superadmin system role
pub const SUPERADMIN_ROLE_ID: i64 = 1;
/// Fixed id of the admin system role
pub const ADMIN_ROLE_ID: i64 = 2;
/// Fixed id of the standard-user system role
pub const STANDARD_USER_ROLE_ID: i64 = 3;

/// System-protected role ids
pub const PROTECTED_ROLE_IDS: [i64; 3] =
    [SUPERADMIN_ROLE_ID, ADMIN_ROLE_ID, STANDARD_USER_ROLE_ID];

/// Role entity with its aggregated membership
#[derive(Debug, Clone)]
pub struct Role {
    /// Store-assigned id (0 until persisted)
    pub role_id: i64,
    /// Unique title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Disabled roles grant nothing
    pub enabled: bool,
    /// Active or soft-deleted
    pub lifecycle: Lifecycle,
    /// Member user ids
    pub member_ids: Vec<UserId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a new enabled role; the store assigns the id on insert
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            role_id: 0,
            title: title.into(),
            description: description.into(),
            enabled: true,
            lifecycle: Lifecycle::Active,
            member_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this is one of the three protected system roles
    pub fn is_protected(&self) -> bool {
        PROTECTED_ROLE_IDS.contains(&self.role_id)
    }

    /// Soft-delete: set the delete marker and clear the enabled flag
    pub fn soft_delete(&mut self) {
        self.lifecycle.delete();
        self.enabled = false;
        self.updated_at = Utc::now();
    }
}

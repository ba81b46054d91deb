//! In-Memory Store Implementation
//!
//! Mirrors the PostgreSQL store's semantics against process-local maps,
//! including the seeded protected roles. Used by unit tests and local
//! development without a database.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::domain::entity::{
    role::{ADMIN_ROLE_ID, Role, STANDARD_USER_ROLE_ID, SUPERADMIN_ROLE_ID},
    user::User,
};
use crate::domain::repository::{RoleStore, UserStore};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    roles: BTreeMap<i64, Role>,
    /// (role_id, user_id) membership links
    role_links: BTreeSet<(i64, Uuid)>,
    /// (user_id, account_id) account links
    account_links: BTreeSet<(Uuid, i64)>,
    next_role_id: i64,
}

/// In-memory user/role store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Fresh store with the protected system roles seeded, matching the
    /// database migration.
    pub fn new() -> Self {
        let mut inner = Inner {
            next_role_id: 100,
            ..Default::default()
        };

        for (id, title, description) in [
            (SUPERADMIN_ROLE_ID, "superadmin", "Full system access"),
            (ADMIN_ROLE_ID, "admin", "Administrative access"),
            (STANDARD_USER_ROLE_ID, "user", "Standard user"),
        ] {
            let mut role = Role::new(title, description);
            role.role_id = id;
            inner.roles.insert(id, role);
        }

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Attach an external account id to a user
    pub fn link_account(&self, user_id: &UserId, account_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.account_links.insert((*user_id.as_uuid(), account_id));
    }

    fn overlay(inner: &Inner, mut user: User) -> User {
        let uuid = *user.user_id.as_uuid();
        user.role_ids = inner
            .role_links
            .iter()
            .filter(|(_, u)| *u == uuid)
            .map(|(r, _)| *r)
            .collect();
        user.account_ids = inner
            .account_links
            .iter()
            .filter(|(u, _)| *u == uuid)
            .map(|(_, a)| *a)
            .collect();
        user
    }

    fn overlay_role(inner: &Inner, mut role: Role) -> Role {
        role.member_ids = inner
            .role_links
            .iter()
            .filter(|(r, _)| *r == role.role_id)
            .map(|(_, u)| UserId::from_uuid(*u))
            .collect();
        role
    }

    fn find_user_by<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .values()
            .find(|u| predicate(u))
            .cloned()
            .map(|u| Self::overlay(&inner, u))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// User Store Implementation
// ============================================================================

impl UserStore for MemoryStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(*user.user_id.as_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .get(user_id.as_uuid())
            .cloned()
            .map(|u| Self::overlay(&inner, u)))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self.find_user_by(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self.find_user_by(|u| u.email == email))
    }

    async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<User>> {
        Ok(self.find_user_by(|u| {
            u.reset_token
                .as_ref()
                .is_some_and(|stored| stored.matches(token))
        }))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(*user.user_id.as_uuid(), user.clone());
        Ok(())
    }

    async fn hard_delete(&self, user_id: &UserId) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let uuid = *user_id.as_uuid();
        inner.users.remove(&uuid);
        inner.role_links.retain(|(_, u)| *u != uuid);
        inner.account_links.retain(|(u, _)| *u != uuid);
        Ok(())
    }
}

// ============================================================================
// Role Store Implementation
// ============================================================================

impl RoleStore for MemoryStore {
    async fn insert(&self, role: &Role) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();

        // Mirror the unique title constraint
        if inner.roles.values().any(|r| r.title == role.title) {
            return Err(AuthError::Internal("role title already exists".to_string()));
        }

        let id = inner.next_role_id;
        inner.next_role_id += 1;

        let mut stored = role.clone();
        stored.role_id = id;
        inner.roles.insert(id, stored);
        Ok(())
    }

    async fn find_by_id(&self, role_id: i64) -> AuthResult<Option<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .get(&role_id)
            .cloned()
            .map(|r| Self::overlay_role(&inner, r)))
    }

    async fn find_by_title(&self, title: &str) -> AuthResult<Option<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .values()
            .find(|r| r.title == title)
            .cloned()
            .map(|r| Self::overlay_role(&inner, r)))
    }

    async fn list(&self, enabled: Option<bool>) -> AuthResult<Vec<Role>> {
        let inner = self.inner.lock().unwrap();
        // BTreeMap iteration gives ascending role_id order
        Ok(inner
            .roles
            .values()
            .filter(|r| enabled.is_none_or(|e| r.enabled == e))
            .cloned()
            .map(|r| Self::overlay_role(&inner, r))
            .collect())
    }

    async fn update_fields(&self, role: &Role) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(stored) = inner.roles.get_mut(&role.role_id) {
            stored.title = role.title.clone();
            stored.description = role.description.clone();
            stored.enabled = role.enabled;
            stored.lifecycle = role.lifecycle;
            stored.updated_at = role.updated_at;
        }
        Ok(())
    }

    async fn delete_links(&self, role_id: i64) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.role_links.retain(|(r, _)| *r != role_id);
        Ok(())
    }

    async fn insert_links(&self, role_id: i64, members: &[UserId]) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for member in members {
            inner.role_links.insert((role_id, *member.as_uuid()));
        }
        Ok(())
    }

    async fn hard_delete(&self, role_id: i64) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.roles.remove(&role_id);
        inner.role_links.retain(|(r, _)| *r != role_id);
        Ok(())
    }
}

//! Role Service
//!
//! Role and membership management. Three system roles with fixed ids are
//! protected: any attempt to disable or delete them fails before any
//! mutation reaches the store.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::audit::{AuditEvent, AuditSink};
use crate::domain::entity::role::{PROTECTED_ROLE_IDS, Role};
use crate::domain::repository::RoleStore;
use crate::error::{AuthError, AuthResult};

/// Role service
pub struct RoleService<S>
where
    S: RoleStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
    config: Arc<AuthConfig>,
}

impl<S> RoleService<S>
where
    S: RoleStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// All roles with aggregated member lists, ordered by id ascending
    pub async fn list(&self) -> AuthResult<Vec<Role>> {
        self.store.list(None).await
    }

    /// Roles filtered by enabled flag
    pub async fn list_enabled(&self, enabled: bool) -> AuthResult<Vec<Role>> {
        self.store.list(Some(enabled)).await
    }

    /// Single-role lookup; none-found is a null result, not an error
    pub async fn get_by_id(&self, role_id: i64) -> AuthResult<Option<Role>> {
        self.store.find_by_id(role_id).await
    }

    /// Single-role lookup by title
    pub async fn get_by_title(&self, title: &str) -> AuthResult<Option<Role>> {
        self.store.find_by_title(title).await
    }

    /// Insert a new enabled role, then re-fetch by title so the caller
    /// gets the canonical persisted record with its store-assigned id.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> AuthResult<Role> {
        let result = self.run_create(Role::new(title, description)).await;
        self.record("role.create", &result, "role created");
        result
    }

    async fn run_create(&self, role: Role) -> AuthResult<Role> {
        self.store.insert(&role).await?;

        let created = self
            .store
            .find_by_title(&role.title)
            .await?
            .ok_or_else(|| AuthError::Internal("created role not found".to_string()))?;

        tracing::info!(role_id = created.role_id, title = %created.title, "role created");

        Ok(created)
    }

    /// Update role fields, then fully replace the membership set.
    ///
    /// Membership replacement is delete-all + re-insert, not a diff. The
    /// two steps are not wrapped in a transaction; a failure in between
    /// can leave the role with no members (known consistency gap).
    pub async fn update(&self, role: Role) -> AuthResult<Role> {
        let result = self.run_update(role).await;
        self.record("role.update", &result, "role updated");
        result
    }

    async fn run_update(&self, role: Role) -> AuthResult<Role> {
        let current = self
            .store
            .find_by_id(role.role_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        // Protected roles can never be disabled; fail before any mutation
        if role.is_protected() && role.enabled != current.enabled {
            return Err(AuthError::ProtectedRole);
        }

        self.store.update_fields(&role).await?;

        self.store.delete_links(role.role_id).await?;
        self.store.insert_links(role.role_id, &role.member_ids).await?;

        tracing::info!(role_id = role.role_id, "role updated");

        Ok(role)
    }

    /// Remove a role: membership links first, then the role itself.
    /// Soft delete in normal operation, hard delete under test config.
    pub async fn remove(&self, role_id: i64) -> AuthResult<()> {
        let result = self.run_remove(role_id).await;
        self.record("role.remove", &result, "role removed");
        result
    }

    async fn run_remove(&self, role_id: i64) -> AuthResult<()> {
        if PROTECTED_ROLE_IDS.contains(&role_id) {
            return Err(AuthError::ProtectedRole);
        }

        let mut role = self
            .store
            .find_by_id(role_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        self.store.delete_links(role_id).await?;

        if self.config.hard_delete_enabled() {
            self.store.hard_delete(role_id).await?;
        } else {
            role.soft_delete();
            self.store.update_fields(&role).await?;
        }

        tracing::info!(role_id, "role removed");

        Ok(())
    }

    fn record<T>(&self, method: &'static str, result: &AuthResult<T>, success: &str) {
        match result {
            Ok(_) => self.audit.record(AuditEvent::success(method, success)),
            Err(e) => self.audit.record(AuditEvent::failure(method, e)),
        }
    }
}

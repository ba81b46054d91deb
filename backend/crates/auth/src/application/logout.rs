//! Logout Use Case
//!
//! Resolves the user and returns the public view. Actual session
//! invalidation is the external session store's concern.

use std::str::FromStr;
use std::sync::Arc;

use crate::audit::{AuditSink, record_outcome};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Logout use case
pub struct LogoutUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> LogoutUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn execute(&self, user_id: Option<&str>) -> AuthResult<User> {
        let result = self.run(user_id).await;
        record_outcome(self.audit.as_ref(), "logout", &result, "logged out");
        result
    }

    async fn run(&self, user_id: Option<&str>) -> AuthResult<User> {
        let id = user_id
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let user_id = UserId::from_str(id).map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        tracing::info!(user_id = %user.user_id, "user logged out");

        Ok(user)
    }
}

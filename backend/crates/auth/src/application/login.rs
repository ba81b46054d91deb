//! Login Use Case
//!
//! Verifies credentials and returns the user on success. The server-side
//! session itself is the external session store's concern; this use case
//! only decides the outcome and mirrors it onto the audit sink.

use std::sync::Arc;

use platform::password::{ClearTextPassword, verify_async};

use crate::audit::{AuditSink, record_outcome};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login use case
pub struct LoginUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> LoginUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<User> {
        let result = self.run(input).await;
        record_outcome(self.audit.as_ref(), "login", &result, "authenticated");
        result
    }

    async fn run(&self, input: LoginInput) -> AuthResult<User> {
        let user = self
            .store
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.lifecycle.is_deleted() {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }

        let password = ClearTextPassword::new(input.password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        // Argon2 runs on the blocking pool; in-flight requests keep moving
        if !verify_async(user.password_hash.clone(), password).await {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.user_id, "user logged in");

        Ok(user)
    }
}

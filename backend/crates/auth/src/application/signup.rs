//! Signup Use Case
//!
//! Creates a new user, or reactivates a soft-deleted record whose
//! username or email matches. Exactly one outcome path executes per
//! call; the checks run as a linear sequence of early returns.

use std::sync::Arc;

use platform::password::{ClearTextPassword, hash_async};

use crate::audit::{AuditSink, record_outcome};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};

/// Signup input
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

/// Signup use case
pub struct SignupUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> SignupUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn execute(&self, input: SignupInput) -> AuthResult<User> {
        let result = self.run(input).await;
        record_outcome(self.audit.as_ref(), "signup", &result, "signed up");
        result
    }

    async fn run(&self, input: SignupInput) -> AuthResult<User> {
        // Reject before any store access
        if input.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if input.password != input.confirm {
            return Err(AuthError::Validation("passwords do not match".to_string()));
        }

        // Username collision: reactivate a soft-deleted record, conflict
        // on an active one
        if !input.username.is_empty() {
            if let Some(existing) = self.store.find_by_username(&input.username).await? {
                return self.reactivate_or_conflict(existing, AuthError::UsernameTaken).await;
            }
        }

        // Same check again by email
        if !input.email.is_empty() {
            if let Some(existing) = self.store.find_by_email(&input.email).await? {
                return self.reactivate_or_conflict(existing, AuthError::EmailTaken).await;
            }
        }

        let password = ClearTextPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let password_hash = hash_async(password).await?;

        let user = User::new(input.username, input.email, password_hash);
        self.store.create(&user).await?;

        tracing::info!(user_id = %user.user_id, username = %user.username, "user signed up");

        Ok(user)
    }

    async fn reactivate_or_conflict(
        &self,
        mut existing: User,
        conflict: AuthError,
    ) -> AuthResult<User> {
        if existing.lifecycle.is_deleted() {
            existing.reactivate();
            self.store.update(&existing).await?;

            tracing::info!(user_id = %existing.user_id, "soft-deleted user reactivated");

            return Ok(existing);
        }

        Err(conflict)
    }
}

//! Password-Reset Use Case
//!
//! Consumes a reset token, replaces the password, and performs an
//! implicit login with the updated credentials.

use std::sync::Arc;

use platform::password::{ClearTextPassword, hash_async};

use crate::audit::{AuditSink, record_outcome};
use crate::application::login::{LoginInput, LoginUseCase};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};

/// Route placeholders that must never be treated as a real token
const PLACEHOLDER_TOKENS: [&str; 2] = [":token", "{token}"];

/// Password-reset use case
pub struct ResetUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> ResetUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn execute(&self, token: &str, new_password: &str) -> AuthResult<User> {
        let result = self.run(token, new_password).await;
        record_outcome(self.audit.as_ref(), "reset", &result, "password reset");
        result
    }

    async fn run(&self, token: &str, new_password: &str) -> AuthResult<User> {
        let token = token.trim();
        if token.is_empty() || PLACEHOLDER_TOKENS.contains(&token) {
            return Err(AuthError::Validation("reset token is required".to_string()));
        }

        let mut user = self
            .store
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let stored = user
            .reset_token
            .as_ref()
            .ok_or(AuthError::InvalidResetToken)?;

        // Expiry is enforced here rather than deferred to the store
        if stored.is_expired() {
            return Err(AuthError::InvalidResetToken);
        }

        let password = ClearTextPassword::new(new_password.to_string())
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let password_hash = hash_async(password).await?;

        user.set_password(password_hash);
        user.clear_reset();
        self.store.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "password reset completed");

        // Implicit login with the now-updated credentials; the outcome
        // (and its audit event) is the login's own
        let login = LoginUseCase::new(self.store.clone(), self.audit.clone());
        login
            .execute(LoginInput {
                email: user.email.clone(),
                password: new_password.to_string(),
            })
            .await
    }
}

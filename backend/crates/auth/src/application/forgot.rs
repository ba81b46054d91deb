//! Forgot-Password Use Case
//!
//! Mints a fresh reset token for a known email. Delivery of the token
//! (e.g. by email) is an external collaborator's responsibility.

use std::sync::Arc;

use crate::audit::{AuditSink, record_outcome};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::reset_token::ResetToken;
use crate::error::{AuthError, AuthResult};

/// Forgot output: the user plus the raw token for delivery
pub struct ForgotOutput {
    pub user: User,
    pub token: ResetToken,
}

/// Forgot-password use case
pub struct ForgotUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> ForgotUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn execute(&self, email: &str) -> AuthResult<ForgotOutput> {
        let result = self.run(email).await;
        record_outcome(self.audit.as_ref(), "forgot", &result, "reset token issued");
        result
    }

    async fn run(&self, email: &str) -> AuthResult<ForgotOutput> {
        if email.is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }

        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidEmail)?;

        // New issuance supersedes any outstanding token
        let token = user.issue_reset();
        self.store.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "password reset token issued");

        Ok(ForgotOutput { user, token })
    }
}

//! Check Use Case
//!
//! Validates an inbound bearer token against the provider's introspection
//! endpoint and resolves the subject to a persisted user. A missing
//! Authorization header fails immediately; no network call is made.

use std::sync::Arc;

use crate::audit::{AuditSink, record_outcome};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};
use crate::infra::provider::TokenProvider;

/// Check output: the user plus the live token pair
pub struct CheckOutput {
    pub user: User,
    pub token: String,
    /// Token expiry (epoch milliseconds)
    pub expires: i64,
}

/// Check use case
pub struct CheckUseCase<S, P>
where
    S: UserStore,
    P: TokenProvider,
{
    store: Arc<S>,
    provider: Arc<P>,
    audit: Arc<dyn AuditSink>,
}

impl<S, P> CheckUseCase<S, P>
where
    S: UserStore,
    P: TokenProvider,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            provider,
            audit,
        }
    }

    pub async fn execute(&self, authorization: Option<&str>) -> AuthResult<CheckOutput> {
        let result = self.run(authorization).await;
        record_outcome(self.audit.as_ref(), "check", &result, "token valid");
        result
    }

    async fn run(&self, authorization: Option<&str>) -> AuthResult<CheckOutput> {
        // Fail fast on a missing header, before any network call
        let header = authorization
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| AuthError::Validation("missing authorization header".to_string()))?;

        let bearer = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        let introspection = self.provider.introspect(bearer).await?;

        if !introspection.active {
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .store
            .find_by_username(&introspection.username)
            .await?
            .filter(|u| u.lifecycle.is_active())
            .ok_or(AuthError::Unauthorized)?;

        Ok(CheckOutput {
            user,
            token: bearer.to_string(),
            expires: introspection.expires,
        })
    }
}

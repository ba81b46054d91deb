//! Two-Factor (TOTP) Use Case
//!
//! Three-state machine. The no-secret branch is checked before the
//! code-verification branch: a first-time user supplying a code with no
//! enrolled secret is routed to provisioning and the code is ignored.
//!
//! States:
//! - A: no secret stored. Provision, persist, return secret + QR.
//! - B: secret stored, no code supplied. Advisory "code required",
//!   a success, since the client is expected to prompt for a code.
//! - C: secret stored, code supplied. Verify, then the three-hop
//!   provider exchange; no retry, the first failed hop aborts.

use std::str::FromStr;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::audit::{AuditEvent, AuditSink};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::{totp_secret::TotpSecret, user_id::UserId};
use crate::error::{AuthError, AuthResult};
use crate::infra::provider::{TokenGrant, TokenProvider};

/// Stub token handed out when the test bypass pair matches; the
/// provider is deliberately not contacted in that path.
const TEST_BYPASS_TOKEN: &str = "test-access-token";

/// Two-factor input
pub struct Ga2faInput {
    pub user_id: Option<String>,
    pub code: Option<String>,
}

/// Two-factor outcome
#[derive(Debug)]
pub enum Ga2faOutput {
    /// State A: freshly provisioned secret and its enrollment QR
    Enrolled { secret: String, qr: String },
    /// State B: secret exists, the client must now supply a code
    CodeRequired,
    /// State C: code verified, token issued
    Verified { grant: TokenGrant },
}

/// Two-factor use case
pub struct Ga2faUseCase<S, P>
where
    S: UserStore,
    P: TokenProvider,
{
    store: Arc<S>,
    provider: Arc<P>,
    audit: Arc<dyn AuditSink>,
    config: Arc<AuthConfig>,
}

impl<S, P> Ga2faUseCase<S, P>
where
    S: UserStore,
    P: TokenProvider,
{
    pub fn new(
        store: Arc<S>,
        provider: Arc<P>,
        audit: Arc<dyn AuditSink>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            store,
            provider,
            audit,
            config,
        }
    }

    pub async fn execute(&self, input: Ga2faInput) -> AuthResult<Ga2faOutput> {
        let result = self.run(input).await;
        match &result {
            Ok(Ga2faOutput::Enrolled { .. }) => self
                .audit
                .record(AuditEvent::success("ga2fa", "2FA secret provisioned")),
            Ok(Ga2faOutput::CodeRequired) => self
                .audit
                .record(AuditEvent::success("ga2fa", "2FA code required")),
            Ok(Ga2faOutput::Verified { .. }) => self
                .audit
                .record(AuditEvent::success("ga2fa", "2FA verified")),
            Err(e) => self.audit.record(AuditEvent::failure("ga2fa", e)),
        }
        result
    }

    async fn run(&self, input: Ga2faInput) -> AuthResult<Ga2faOutput> {
        let id = input
            .user_id
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::IncorrectCode)?;

        let user_id = UserId::from_str(&id).map_err(|_| AuthError::IncorrectCode)?;

        let mut user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::IncorrectCode)?;

        // No-secret path wins over verification, even when a code came along
        let Some(secret) = user.totp_secret.clone() else {
            return self.provision(&mut user).await;
        };

        let Some(code) = input.code.filter(|c| !c.is_empty()) else {
            return Ok(Ga2faOutput::CodeRequired);
        };

        self.verify(&user, &secret, &code).await
    }

    /// State A: provision and persist a secret, return enrollment material
    async fn provision(&self, user: &mut User) -> AuthResult<Ga2faOutput> {
        let secret = match &self.config.totp_bypass {
            // Test environment gets the well-known secret for determinism
            Some(bypass) => TotpSecret::from_base32(&bypass.secret)?,
            None => TotpSecret::generate(),
        };

        user.enroll_totp(secret.clone());
        self.store.update(user).await?;

        let qr = secret.qr_base64(&user.username)?;

        tracing::info!(user_id = %user.user_id, "TOTP secret provisioned");

        Ok(Ga2faOutput::Enrolled {
            secret: secret.as_base32().to_string(),
            qr,
        })
    }

    /// State C: verify the code, then run the provider exchange chain
    async fn verify(
        &self,
        user: &User,
        secret: &TotpSecret,
        code: &str,
    ) -> AuthResult<Ga2faOutput> {
        if self.bypass_matches(secret, code) {
            // Deterministic test path: no external network call
            tracing::debug!(user_id = %user.user_id, "2FA test bypass accepted");
            return Ok(Ga2faOutput::Verified {
                grant: TokenGrant {
                    access_token: TEST_BYPASS_TOKEN.to_string(),
                    expires: (chrono::Utc::now() + chrono::Duration::hours(1))
                        .timestamp_millis(),
                },
            });
        }

        if !secret.verify(code, &user.username)? {
            return Err(AuthError::IncorrectCode);
        }

        // Sequential exchange: credentials, then authorization code,
        // then token. Any hop's failure aborts the whole completion.
        let client = self.provider.fetch_client().await?;
        let auth_code = self.provider.authorize(&client.client_id, &user.user_id).await?;
        let grant = self.provider.exchange(&auth_code, &client).await?;

        tracing::info!(user_id = %user.user_id, "2FA verified, token issued");

        Ok(Ga2faOutput::Verified { grant })
    }

    fn bypass_matches(&self, secret: &TotpSecret, code: &str) -> bool {
        self.config
            .totp_bypass
            .as_ref()
            .is_some_and(|b| b.secret == secret.as_base32() && b.code == code)
    }
}

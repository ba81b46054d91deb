//! Use-case tests for the auth crate
//!
//! Run against the in-memory store, a mock token provider, and a
//! recording audit sink; no database or network involved.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use crate::application::config::{AuthConfig, TEST_TOTP_CODE, TEST_TOTP_SECRET};
use crate::application::{
    CheckUseCase, ForgotUseCase, Ga2faInput, Ga2faOutput, Ga2faUseCase, LoginInput, LoginUseCase,
    LogoutUseCase, ResetUseCase, RoleService, SignupInput, SignupUseCase,
};
use crate::audit::{AuditEvent, AuditSink};
use crate::domain::entity::role::{PROTECTED_ROLE_IDS, SUPERADMIN_ROLE_ID};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::reset_token::{RESET_TOKEN_TTL_MS, ResetToken};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::infra::memory::MemoryStore;
use crate::infra::provider::{ClientCredentials, Introspection, TokenGrant, TokenProvider};
use platform::password::ClearTextPassword;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    fn last(&self) -> AuditEvent {
        self.events().last().cloned().expect("no audit events")
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

const MOCK_EXPIRES: i64 = 4_102_444_800_000;

#[derive(Clone)]
struct MockProvider {
    calls: Arc<Mutex<usize>>,
    fail: bool,
    subject: String,
    active: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            fail: false,
            subject: "alice".to_string(),
            active: true,
        }
    }
}

impl MockProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn count(&self) -> AuthResult<()> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(AuthError::Provider("endpoint unavailable".to_string()));
        }
        Ok(())
    }
}

impl TokenProvider for MockProvider {
    async fn fetch_client(&self) -> AuthResult<ClientCredentials> {
        self.count()?;
        Ok(ClientCredentials {
            client_id: "cid".to_string(),
            client_secret: "sec".to_string(),
        })
    }

    async fn authorize(&self, _client_id: &str, _user_id: &UserId) -> AuthResult<String> {
        self.count()?;
        Ok("authcode".to_string())
    }

    async fn exchange(&self, _code: &str, _client: &ClientCredentials) -> AuthResult<TokenGrant> {
        self.count()?;
        Ok(TokenGrant {
            access_token: "issued-token".to_string(),
            expires: MOCK_EXPIRES,
        })
    }

    async fn introspect(&self, _bearer: &str) -> AuthResult<Introspection> {
        self.count()?;
        Ok(Introspection {
            active: self.active,
            username: self.subject.clone(),
            expires: MOCK_EXPIRES,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn sink() -> Arc<RecordingSink> {
    Arc::new(RecordingSink::default())
}

fn hash(password: &str) -> platform::password::HashedPassword {
    ClearTextPassword::new(password.to_string())
        .unwrap()
        .hash()
        .unwrap()
}

async fn seed_user(store: &Arc<MemoryStore>, username: &str, email: &str, password: &str) -> User {
    let user = User::new(username, email, hash(password));
    store.create(&user).await.unwrap();
    user
}

fn signup_input(username: &str, email: &str, password: &str) -> SignupInput {
    SignupInput {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        confirm: password.to_string(),
    }
}

// ============================================================================
// Signup
// ============================================================================

mod signup_tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_creates_enabled_user() {
        let store = Arc::new(MemoryStore::new());
        let use_case = SignupUseCase::new(store.clone(), sink());

        let user = use_case
            .execute(signup_input("alice", "alice@example.com", "correct-horse"))
            .await
            .unwrap();

        assert!(user.enabled);
        assert!(user.lifecycle.is_active());

        let persisted = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(persisted.user_id, user.user_id);
        assert_eq!(persisted.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_signup_rejects_empty_password() {
        let store = Arc::new(MemoryStore::new());
        let use_case = SignupUseCase::new(store.clone(), sink());

        let result = use_case
            .execute(signup_input("alice", "alice@example.com", ""))
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
        // Rejected before any store access
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_rejects_password_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let use_case = SignupUseCase::new(store, sink());

        let result = use_case
            .execute(SignupInput {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "one-password".to_string(),
                confirm: "other-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_active_username_always_conflicts() {
        let store = Arc::new(MemoryStore::new());
        seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = SignupUseCase::new(store, sink());

        // Different email, different password; the conflict still wins
        let result = use_case
            .execute(signup_input("alice", "other@example.com", "another-pass"))
            .await;

        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_signup_reactivates_soft_deleted_username() {
        let store = Arc::new(MemoryStore::new());
        let mut user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;
        user.soft_delete();
        store.update(&user).await.unwrap();

        let use_case = SignupUseCase::new(store.clone(), sink());

        let reactivated = use_case
            .execute(signup_input("alice", "alice@example.com", "whatever-pass"))
            .await
            .unwrap();

        // Same record, delete marker cleared, enabled again
        assert_eq!(reactivated.user_id, user.user_id);
        assert!(reactivated.enabled);
        assert!(reactivated.lifecycle.is_active());

        let persisted = store.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert!(persisted.lifecycle.is_active());
    }

    #[tokio::test]
    async fn test_signup_email_conflict_and_reactivation() {
        let store = Arc::new(MemoryStore::new());
        let mut user = seed_user(&store, "bob", "bob@example.com", "correct-horse").await;

        let use_case = SignupUseCase::new(store.clone(), sink());

        // Active record with the same email conflicts
        let result = use_case
            .execute(signup_input("robert", "bob@example.com", "another-pass"))
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));

        // Soft-deleted record with the same email reactivates
        user.soft_delete();
        store.update(&user).await.unwrap();

        let reactivated = use_case
            .execute(signup_input("robert", "bob@example.com", "another-pass"))
            .await
            .unwrap();
        assert_eq!(reactivated.user_id, user.user_id);
        assert!(reactivated.enabled);
    }
}

// ============================================================================
// Login
// ============================================================================

mod login_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_success() {
        let store = Arc::new(MemoryStore::new());
        seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let audit = sink();
        let use_case = LoginUseCase::new(store, audit.clone());

        let user = use_case
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        assert!(user.lifecycle.is_active());
        assert_eq!(audit.last().method, "login");
        assert_eq!(audit.last().code, 200);
    }

    #[tokio::test]
    async fn test_login_disabled_user_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;
        user.enabled = false;
        store.update(&user).await.unwrap();

        let audit = sink();
        let use_case = LoginUseCase::new(store, audit.clone());

        // Valid credentials are irrelevant once the account is disabled
        let result = use_case
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::AccountDisabled)));
        assert_eq!(audit.last().code, 401);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let store = Arc::new(MemoryStore::new());
        seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = LoginUseCase::new(store, sink());

        let result = use_case
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "wrong-horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_fails() {
        let store = Arc::new(MemoryStore::new());
        let use_case = LoginUseCase::new(store, sink());

        let result = use_case
            .execute(LoginInput {
                email: "nobody@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_soft_deleted_user_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;
        user.soft_delete();
        store.update(&user).await.unwrap();

        let use_case = LoginUseCase::new(store, sink());

        let result = use_case
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;

        assert!(result.is_err());
    }
}

// ============================================================================
// Two-Factor
// ============================================================================

mod ga2fa_tests {
    use super::*;

    fn make_use_case(
        store: &Arc<MemoryStore>,
        provider: &Arc<MockProvider>,
        config: AuthConfig,
    ) -> Ga2faUseCase<MemoryStore, MockProvider> {
        Ga2faUseCase::new(store.clone(), provider.clone(), sink(), Arc::new(config))
    }

    fn input(id: &UserId, code: Option<&str>) -> Ga2faInput {
        Ga2faInput {
            user_id: Some(id.to_string()),
            code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_provisions_secret_then_advises() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::default());

        // State A: no secret, no code
        let output = use_case.execute(input(&user.user_id, None)).await.unwrap();
        let secret = match output {
            Ga2faOutput::Enrolled { secret, qr } => {
                assert!(!qr.is_empty());
                secret
            }
            _ => panic!("expected enrollment"),
        };

        let persisted = store.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(persisted.totp_secret.unwrap().as_base32(), secret);

        // State B: secret exists, no code -> advisory, not a new secret
        let output = use_case.execute(input(&user.user_id, None)).await.unwrap();
        assert!(matches!(output, Ga2faOutput::CodeRequired));

        let unchanged = store.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(unchanged.totp_secret.unwrap().as_base32(), secret);
    }

    #[tokio::test]
    async fn test_first_enrollment_ignores_supplied_code() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::default());

        // No enrolled secret: the no-secret branch wins, the code is ignored
        let output = use_case
            .execute(input(&user.user_id, Some("123456")))
            .await
            .unwrap();

        assert!(matches!(output, Ga2faOutput::Enrolled { .. }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_user_fails() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let use_case = make_use_case(&store, &provider, AuthConfig::default());

        let result = use_case
            .execute(Ga2faInput {
                user_id: None,
                code: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::IncorrectCode)));

        let result = use_case
            .execute(input(&UserId::new(), None))
            .await;
        assert!(matches!(result, Err(AuthError::IncorrectCode)));
    }

    #[tokio::test]
    async fn test_wrong_code_fails() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::default());
        use_case.execute(input(&user.user_id, None)).await.unwrap();

        let result = use_case
            .execute(input(&user.user_id, Some("000000")))
            .await;

        assert!(matches!(result, Err(AuthError::IncorrectCode)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_code_runs_three_hop_exchange() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::default());
        use_case.execute(input(&user.user_id, None)).await.unwrap();

        let secret = store
            .find_by_id(&user.user_id)
            .await
            .unwrap()
            .unwrap()
            .totp_secret
            .unwrap();
        let code = secret.generate_current("alice").unwrap();

        let output = use_case
            .execute(input(&user.user_id, Some(&code)))
            .await
            .unwrap();

        match output {
            Ga2faOutput::Verified { grant } => {
                assert_eq!(grant.access_token, "issued-token");
                assert_eq!(grant.expires, MOCK_EXPIRES);
            }
            _ => panic!("expected verification"),
        }

        // credentials + authorize + exchange
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_as_unauthorized_outcome() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::failing());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::default());
        use_case.execute(input(&user.user_id, None)).await.unwrap();

        let secret = store
            .find_by_id(&user.user_id)
            .await
            .unwrap()
            .unwrap()
            .totp_secret
            .unwrap();
        let code = secret.generate_current("alice").unwrap();

        let result = use_case.execute(input(&user.user_id, Some(&code))).await;

        // First failed hop aborts the chain, no retry
        let err = result.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
        assert_eq!(err.status_code().as_u16(), 401);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_bypass_pair_succeeds_without_network() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = make_use_case(&store, &provider, AuthConfig::test());

        // Test environment provisions the well-known secret
        let output = use_case.execute(input(&user.user_id, None)).await.unwrap();
        match output {
            Ga2faOutput::Enrolled { secret, .. } => assert_eq!(secret, TEST_TOTP_SECRET),
            _ => panic!("expected enrollment"),
        }

        // The fixed pair verifies deterministically, provider untouched
        let output = use_case
            .execute(input(&user.user_id, Some(TEST_TOTP_CODE)))
            .await
            .unwrap();

        assert!(matches!(output, Ga2faOutput::Verified { .. }));
        assert_eq!(provider.calls(), 0);
    }
}

// ============================================================================
// Forgot / Reset
// ============================================================================

mod forgot_reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_forgot_empty_email_fails_fast() {
        let store = Arc::new(MemoryStore::new());
        let use_case = ForgotUseCase::new(store, sink());

        let result = use_case.execute("").await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_forgot_unknown_email_fails() {
        let store = Arc::new(MemoryStore::new());
        let use_case = ForgotUseCase::new(store, sink());

        let result = use_case.execute("nobody@example.com").await;
        assert!(matches!(result, Err(AuthError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_forgot_issues_one_hour_token() {
        let store = Arc::new(MemoryStore::new());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = ForgotUseCase::new(store.clone(), sink());

        let before = Utc::now();
        let output = use_case.execute("alice@example.com").await.unwrap();
        let after = Utc::now();

        assert_eq!(output.user.user_id, user.user_id);
        assert_eq!(output.token.as_str().len(), 32);

        let ttl = Duration::milliseconds(RESET_TOKEN_TTL_MS);
        assert!(output.token.expires_at() >= before + ttl);
        assert!(output.token.expires_at() <= after + ttl);

        // Raw token is persisted and findable
        let persisted = store
            .find_by_reset_token(output.token.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.user_id, user.user_id);
    }

    #[tokio::test]
    async fn test_forgot_reissue_supersedes() {
        let store = Arc::new(MemoryStore::new());
        seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let use_case = ForgotUseCase::new(store.clone(), sink());

        let first = use_case.execute("alice@example.com").await.unwrap();
        let second = use_case.execute("alice@example.com").await.unwrap();

        assert_ne!(first.token.as_str(), second.token.as_str());
        assert!(
            store
                .find_by_reset_token(first.token.as_str())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_reset_rejects_missing_or_placeholder_token() {
        let store = Arc::new(MemoryStore::new());
        let use_case = ResetUseCase::new(store, sink());

        for token in ["", "  ", ":token", "{token}"] {
            let result = use_case.execute(token, "new-password-42").await;
            assert!(matches!(result, Err(AuthError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_reset_unknown_token_fails() {
        let store = Arc::new(MemoryStore::new());
        let use_case = ResetUseCase::new(store, sink());

        let result = use_case
            .execute("deadbeefdeadbeefdeadbeefdeadbeef", "new-password-42")
            .await;

        assert!(matches!(result, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_expired_token_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let expired = ResetToken::from_parts(
            "deadbeefdeadbeefdeadbeefdeadbeef",
            Utc::now() - Duration::seconds(1),
        );
        user.reset_token = Some(expired);
        store.update(&user).await.unwrap();

        let use_case = ResetUseCase::new(store, sink());

        let result = use_case
            .execute("deadbeefdeadbeefdeadbeefdeadbeef", "new-password-42")
            .await;

        assert!(matches!(result, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_clears_token_and_logs_in_with_new_password() {
        let store = Arc::new(MemoryStore::new());
        let user = seed_user(&store, "alice", "alice@example.com", "old-password-1").await;

        let forgot = ForgotUseCase::new(store.clone(), sink());
        let issued = forgot.execute("alice@example.com").await.unwrap();

        let reset = ResetUseCase::new(store.clone(), sink());
        let logged_in = reset
            .execute(issued.token.as_str(), "new-password-42")
            .await
            .unwrap();
        assert_eq!(logged_in.user_id, user.user_id);

        // Token and expiry are consumed
        let persisted = store.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert!(persisted.reset_token.is_none());

        // Old password no longer works, the new one does
        let login = LoginUseCase::new(store.clone(), sink());
        assert!(
            login
                .execute(LoginInput {
                    email: "alice@example.com".to_string(),
                    password: "old-password-1".to_string(),
                })
                .await
                .is_err()
        );
        assert!(
            login
                .execute(LoginInput {
                    email: "alice@example.com".to_string(),
                    password: "new-password-42".to_string(),
                })
                .await
                .is_ok()
        );
    }
}

// ============================================================================
// Roles
// ============================================================================

mod role_tests {
    use super::*;

    fn service(store: &Arc<MemoryStore>, config: AuthConfig) -> RoleService<MemoryStore> {
        RoleService::new(store.clone(), sink(), Arc::new(config))
    }

    #[tokio::test]
    async fn test_list_is_seeded_and_ordered() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let roles = service.list().await.unwrap();
        let ids: Vec<i64> = roles.iter().map(|r| r.role_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_returns_canonical_record() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let role = service.create("auditors", "read-only reviewers").await.unwrap();

        assert!(role.role_id > 0);
        assert!(role.enabled);
        assert_eq!(role.title, "auditors");

        let fetched = service.get_by_title("auditors").await.unwrap().unwrap();
        assert_eq!(fetched.role_id, role.role_id);
    }

    #[tokio::test]
    async fn test_get_unknown_is_null_not_error() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        assert!(service.get_by_id(9999).await.unwrap().is_none());
        assert!(service.get_by_title("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_protected_enabled_flip_fails_before_mutation() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let mut role = service.get_by_id(SUPERADMIN_ROLE_ID).await.unwrap().unwrap();
        role.enabled = false;

        let result = service.update(role).await;
        assert!(matches!(result, Err(AuthError::ProtectedRole)));

        // Store untouched
        let unchanged = service.get_by_id(SUPERADMIN_ROLE_ID).await.unwrap().unwrap();
        assert!(unchanged.enabled);
    }

    #[tokio::test]
    async fn test_update_protected_without_flip_is_allowed() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let mut role = service.get_by_id(SUPERADMIN_ROLE_ID).await.unwrap().unwrap();
        role.description = "updated description".to_string();

        let updated = service.update(role).await.unwrap();
        assert_eq!(updated.description, "updated description");
    }

    #[tokio::test]
    async fn test_update_fully_replaces_membership() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let a = seed_user(&store, "a", "a@example.com", "password-aaa").await;
        let b = seed_user(&store, "b", "b@example.com", "password-bbb").await;

        let mut role = service.create("team", "").await.unwrap();
        role.member_ids = vec![a.user_id, b.user_id];
        let role = service.update(role).await.unwrap();

        let fetched = service.get_by_id(role.role_id).await.unwrap().unwrap();
        assert_eq!(fetched.member_ids.len(), 2);

        // Replacement, not a diff
        let mut role = fetched;
        role.member_ids = vec![b.user_id];
        service.update(role.clone()).await.unwrap();

        let fetched = service.get_by_id(role.role_id).await.unwrap().unwrap();
        assert_eq!(fetched.member_ids, vec![b.user_id]);

        // The user's derived role list follows the links
        let user_b = store.find_by_id(&b.user_id).await.unwrap().unwrap();
        assert_eq!(user_b.role_ids, vec![role.role_id]);
    }

    #[tokio::test]
    async fn test_remove_protected_always_fails() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        for id in PROTECTED_ROLE_IDS {
            let result = service.remove(id).await;
            assert!(matches!(result, Err(AuthError::ProtectedRole)));
            assert!(service.get_by_id(id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_remove_soft_deletes_in_production() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let a = seed_user(&store, "a", "a@example.com", "password-aaa").await;

        let mut role = service.create("temps", "").await.unwrap();
        role.member_ids = vec![a.user_id];
        let role = service.update(role).await.unwrap();

        service.remove(role.role_id).await.unwrap();

        // Links deleted, role soft-deleted and disabled
        let removed = service.get_by_id(role.role_id).await.unwrap().unwrap();
        assert!(removed.lifecycle.is_deleted());
        assert!(!removed.enabled);
        assert!(removed.member_ids.is_empty());
    }

    #[tokio::test]
    async fn test_remove_hard_deletes_under_test_config() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::test());

        let role = service.create("temps", "").await.unwrap();
        service.remove(role.role_id).await.unwrap();

        assert!(service.get_by_id(role.role_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_enabled_filters() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store, AuthConfig::default());

        let mut role = service.create("dormant", "").await.unwrap();
        role.enabled = false;
        service.update(role.clone()).await.unwrap();

        let enabled = service.list_enabled(true).await.unwrap();
        assert!(enabled.iter().all(|r| r.enabled));
        assert!(!enabled.iter().any(|r| r.role_id == role.role_id));

        let disabled = service.list_enabled(false).await.unwrap();
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].role_id, role.role_id);
    }
}

// ============================================================================
// Check / Logout
// ============================================================================

mod check_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_header_fails_without_network_call() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let use_case = CheckUseCase::new(store, provider.clone(), sink());

        let result = use_case.execute(None).await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_inactive_token_is_unauthorized() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider {
            active: false,
            ..Default::default()
        });
        let use_case = CheckUseCase::new(store, provider, sink());

        let result = use_case.execute(Some("Bearer tok123")).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthorized() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let use_case = CheckUseCase::new(store, provider, sink());

        let result = use_case.execute(Some("Bearer tok123")).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_valid_token_resolves_subject_with_live_pair() {
        let store = Arc::new(MemoryStore::new());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;
        store.link_account(&user.user_id, 7);

        let provider = Arc::new(MockProvider::default());
        let use_case = CheckUseCase::new(store, provider, sink());

        let output = use_case.execute(Some("Bearer tok123")).await.unwrap();

        assert_eq!(output.user.username, "alice");
        assert_eq!(output.user.account_ids, vec![7]);
        assert_eq!(output.token, "tok123");
        assert_eq!(output.expires, MOCK_EXPIRES);
    }
}

mod logout_tests {
    use super::*;

    #[tokio::test]
    async fn test_logout_missing_or_unknown_id_fails() {
        let store = Arc::new(MemoryStore::new());
        let use_case = LogoutUseCase::new(store, sink());

        assert!(matches!(
            use_case.execute(None).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            use_case.execute(Some("")).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            use_case.execute(Some(&UserId::new().to_string())).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_logout_returns_user() {
        let store = Arc::new(MemoryStore::new());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let audit = sink();
        let use_case = LogoutUseCase::new(store, audit.clone());

        let out = use_case
            .execute(Some(&user.user_id.to_string()))
            .await
            .unwrap();

        assert_eq!(out.user_id, user.user_id);
        assert_eq!(audit.last().method, "logout");
        assert_eq!(audit.last().code, 200);
    }
}

// ============================================================================
// Audit mirroring
// ============================================================================

mod audit_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_branch_is_mirrored() {
        let store = Arc::new(MemoryStore::new());
        seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let audit = sink();
        let login = LoginUseCase::new(store.clone(), audit.clone());

        let _ = login
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;
        let _ = login
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        let events = audit.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].code, 200);
        assert_eq!(events[1].code, 401);
        assert!(events.iter().all(|e| e.method == "login"));
        assert_eq!(events[1].response, "invalid username or password");
    }

    #[tokio::test]
    async fn test_advisory_branch_is_a_success_event() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockProvider::default());
        let user = seed_user(&store, "alice", "alice@example.com", "correct-horse").await;

        let audit = sink();
        let use_case = Ga2faUseCase::new(
            store.clone(),
            provider,
            audit.clone(),
            Arc::new(AuthConfig::default()),
        );

        let _ = use_case
            .execute(Ga2faInput {
                user_id: Some(user.user_id.to_string()),
                code: None,
            })
            .await;
        let _ = use_case
            .execute(Ga2faInput {
                user_id: Some(user.user_id.to_string()),
                code: None,
            })
            .await;

        let events = audit.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].response, "2FA secret provisioned");
        assert_eq!(events[1].response, "2FA code required");
        assert!(events.iter().all(|e| e.code == 200));
    }
}

// ============================================================================
// Role scoping sanity for the seeded protected roles
// ============================================================================

mod protected_role_tests {
    use super::*;
    use crate::domain::repository::RoleStore;

    #[tokio::test]
    async fn test_seeded_roles_match_migration() {
        let store = Arc::new(MemoryStore::new());

        let superadmin = store.find_by_title("superadmin").await.unwrap().unwrap();
        assert_eq!(superadmin.role_id, 1);

        let admin = store.find_by_title("admin").await.unwrap().unwrap();
        assert_eq!(admin.role_id, 2);

        let standard = store.find_by_title("user").await.unwrap().unwrap();
        assert_eq!(standard.role_id, 3);

        for role in [&superadmin, &admin, &standard] {
            assert!(role.is_protected());
            assert!(role.enabled);
        }
    }

    #[tokio::test]
    async fn test_new_roles_are_never_protected() {
        let store = Arc::new(MemoryStore::new());
        let service = RoleService::new(store.clone(), sink(), Arc::new(AuthConfig::default()));

        let role = service.create("ops", "").await.unwrap();
        assert!(!role.is_protected());

        let listed = service.list().await.unwrap();
        assert!(listed.iter().any(|r| r.role_id == role.role_id));
    }
}

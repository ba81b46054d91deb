//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckUseCase, ForgotUseCase, Ga2faInput, Ga2faOutput, Ga2faUseCase, LoginInput, LoginUseCase,
    LogoutUseCase, ResetUseCase, RoleService, SignupInput, SignupUseCase,
};
use crate::audit::AuditSink;
use crate::domain::entity::role::Role;
use crate::domain::repository::{RoleStore, UserStore};
use crate::domain::value_object::{lifecycle::Lifecycle, user_id::UserId};
use crate::error::{AuthError, AuthResult};
use crate::infra::provider::TokenProvider;
use crate::presentation::dto::{
    ForgotRequest, ForgotResponse, Ga2faEnrollResponse, Ga2faRequest, Ga2faVerifiedResponse,
    LoginRequest, LogoutRequest, MessageResponse, PingResponse, PublicUser, ResetRequest,
    RoleCreateRequest, RoleDto, RoleUpdateRequest, SignupRequest, UserEnvelope,
};

/// Shared state for auth handlers
pub struct AppState<S, P>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub provider: Arc<P>,
    pub audit: Arc<dyn AuditSink>,
    pub config: Arc<AuthConfig>,
}

impl<S, P> Clone for AppState<S, P>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
            audit: self.audit.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Ping
// ============================================================================

/// GET /auth
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { ping: "pong" })
}

// ============================================================================
// Check
// ============================================================================

/// GET /auth/check
pub async fn check<S, P>(
    State(state): State<AppState<S, P>>,
    headers: HeaderMap,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let use_case = CheckUseCase::new(
        state.store.clone(),
        state.provider.clone(),
        state.audit.clone(),
    );

    let output = use_case.execute(authorization).await?;

    Ok(Json(UserEnvelope {
        user: PublicUser::with_token(&output.user, output.token, output.expires),
    }))
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
pub async fn login<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.store.clone(), state.audit.clone());

    let user = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(UserEnvelope {
        user: PublicUser::from_user(&user),
    }))
}

// ============================================================================
// Two-Factor
// ============================================================================

/// POST /auth/ga2fa
pub async fn ga2fa<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<Ga2faRequest>,
) -> AuthResult<Response>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = Ga2faUseCase::new(
        state.store.clone(),
        state.provider.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(Ga2faInput {
            user_id: req.id,
            code: req.code,
        })
        .await?;

    // All three states are HTTP 200; the body shape distinguishes them
    let response = match output {
        Ga2faOutput::Enrolled { secret, qr } => {
            Json(Ga2faEnrollResponse { qr, secret }).into_response()
        }
        Ga2faOutput::CodeRequired => Json(MessageResponse {
            message: "2FA code required".to_string(),
        })
        .into_response(),
        Ga2faOutput::Verified { grant } => Json(Ga2faVerifiedResponse {
            status: "verified",
            data: grant,
        })
        .into_response(),
    };

    Ok(response)
}

// ============================================================================
// Signup
// ============================================================================

/// POST /auth/signup
pub async fn signup<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<SignupRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = SignupUseCase::new(state.store.clone(), state.audit.clone());

    let user = use_case
        .execute(SignupInput {
            username: req.username,
            email: req.email,
            password: req.password,
            confirm: req.confirm,
        })
        .await?;

    Ok(Json(UserEnvelope {
        user: PublicUser::from_user(&user),
    }))
}

// ============================================================================
// Forgot / Reset
// ============================================================================

/// POST /auth/forgot
pub async fn forgot<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<ForgotRequest>,
) -> AuthResult<Json<ForgotResponse>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = ForgotUseCase::new(state.store.clone(), state.audit.clone());

    let output = use_case.execute(&req.email).await?;

    Ok(Json(ForgotResponse {
        user: PublicUser::from_user(&output.user),
        token: output.token.as_str().to_string(),
    }))
}

/// POST /auth/reset/{token}
pub async fn reset<S, P>(
    State(state): State<AppState<S, P>>,
    Path(token): Path<String>,
    Json(req): Json<ResetRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    run_reset(&state, &token, &req.password).await
}

/// GET /auth/reset/{token}
///
/// The GET form carries no body; the reset proceeds with an empty
/// password and fails the same way a missing field does.
pub async fn reset_get<S, P>(
    State(state): State<AppState<S, P>>,
    Path(token): Path<String>,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    run_reset(&state, &token, "").await
}

async fn run_reset<S, P>(
    state: &AppState<S, P>,
    token: &str,
    password: &str,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = ResetUseCase::new(state.store.clone(), state.audit.clone());

    let user = use_case.execute(token, password).await?;

    Ok(Json(UserEnvelope {
        user: PublicUser::from_user(&user),
    }))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /auth/logout
pub async fn logout<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<LogoutRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let use_case = LogoutUseCase::new(state.store.clone(), state.audit.clone());

    let user = use_case.execute(req.id.as_deref()).await?;

    Ok(Json(UserEnvelope {
        user: PublicUser::from_user(&user),
    }))
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RolesQuery {
    pub enabled: Option<bool>,
}

/// GET /roles
pub async fn roles_list<S, P>(
    State(state): State<AppState<S, P>>,
    Query(query): Query<RolesQuery>,
) -> AuthResult<Json<Vec<RoleDto>>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let service = role_service(&state);

    let roles = match query.enabled {
        Some(enabled) => service.list_enabled(enabled).await?,
        None => service.list().await?,
    };

    Ok(Json(roles.iter().map(RoleDto::from_role).collect()))
}

/// GET /roles/{id}
pub async fn roles_get<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<i64>,
) -> AuthResult<Json<Option<RoleDto>>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let role = role_service(&state).get_by_id(id).await?;

    // None-found is a null result, not an error
    Ok(Json(role.as_ref().map(RoleDto::from_role)))
}

/// POST /roles
pub async fn roles_create<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<RoleCreateRequest>,
) -> AuthResult<Json<RoleDto>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let role = role_service(&state)
        .create(req.title, req.description)
        .await?;

    Ok(Json(RoleDto::from_role(&role)))
}

/// PUT /roles
pub async fn roles_update<S, P>(
    State(state): State<AppState<S, P>>,
    Json(req): Json<RoleUpdateRequest>,
) -> AuthResult<Json<RoleDto>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    let member_ids = req
        .users
        .iter()
        .map(|id| UserId::from_str(id))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AuthError::Validation("invalid member user id".to_string()))?;

    let mut role = Role::new(req.title, req.description);
    role.role_id = req.id;
    role.enabled = req.enabled;
    role.member_ids = member_ids;
    if req.removed {
        role.lifecycle = Lifecycle::Deleted {
            at: chrono::Utc::now(),
        };
    }

    let updated = role_service(&state).update(role).await?;

    Ok(Json(RoleDto::from_role(&updated)))
}

/// DELETE /roles/{id}
pub async fn roles_remove<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<i64>,
) -> AuthResult<Json<MessageResponse>>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    role_service(&state).remove(id).await?;

    Ok(Json(MessageResponse {
        message: "role removed".to_string(),
    }))
}

fn role_service<S, P>(state: &AppState<S, P>) -> RoleService<S>
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    RoleService::new(
        state.store.clone(),
        state.audit.clone(),
        state.config.clone(),
    )
}

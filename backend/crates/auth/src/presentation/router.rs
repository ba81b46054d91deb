//! Auth Router

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::audit::TracingAuditSink;
use crate::domain::repository::{RoleStore, UserStore};
use crate::infra::postgres::PgStore;
use crate::infra::provider::{HttpTokenProvider, TokenProvider};
use crate::presentation::handlers::{self, AppState};

/// Create the /auth router for any store/provider implementation
pub fn auth_router<S, P>(state: AppState<S, P>) -> Router
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::ping))
        .route("/check", get(handlers::check::<S, P>))
        .route("/login", post(handlers::login::<S, P>))
        .route("/ga2fa", post(handlers::ga2fa::<S, P>))
        .route("/signup", post(handlers::signup::<S, P>))
        .route("/forgot", post(handlers::forgot::<S, P>))
        .route(
            "/reset/{token}",
            get(handlers::reset_get::<S, P>).post(handlers::reset::<S, P>),
        )
        .route("/logout", post(handlers::logout::<S, P>))
        .with_state(state)
}

/// Create the /roles router for any store/provider implementation
pub fn roles_router<S, P>(state: AppState<S, P>) -> Router
where
    S: UserStore + RoleStore + Send + Sync + 'static,
    P: TokenProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::roles_list::<S, P>))
        .route("/", post(handlers::roles_create::<S, P>))
        .route("/", put(handlers::roles_update::<S, P>))
        .route("/{id}", get(handlers::roles_get::<S, P>))
        .route("/{id}", delete(handlers::roles_remove::<S, P>))
        .with_state(state)
}

/// Assemble the full API router over PostgreSQL and the HTTP provider
pub fn api_router(store: PgStore, config: AuthConfig) -> Router {
    let provider = HttpTokenProvider::new(config.provider.clone());

    let state = AppState {
        store: Arc::new(store),
        provider: Arc::new(provider),
        audit: Arc::new(TracingAuditSink),
        config: Arc::new(config),
    };

    Router::new()
        .nest("/auth", auth_router(state.clone()))
        .nest("/roles", roles_router(state))
}

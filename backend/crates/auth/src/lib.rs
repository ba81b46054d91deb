//! Auth (Authentication & Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store traits
//! - `application/` - Use cases and the role service
//! - `infra/` - Database/in-memory stores, provider client
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Features
//! - Credential login with Argon2id verification
//! - TOTP-based 2FA with delegated token issuance (OAuth-style provider)
//! - Password-reset token lifecycle (1-hour single-use tokens)
//! - Signup with soft-delete reactivation
//! - Role model with protected system roles
//!
//! ## Observability
//! Every orchestrator outcome, success or failure, is mirrored onto the
//! injected [`audit::AuditSink`] before the response is sent.

pub mod application;
pub mod audit;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgStore;
pub use presentation::router::api_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::role::*;
    pub use crate::domain::entity::user::*;
    pub use crate::domain::value_object::lifecycle::*;
    pub use crate::domain::value_object::reset_token::*;
    pub use crate::domain::value_object::totp_secret::*;
    pub use crate::domain::value_object::user_id::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::memory::MemoryStore;
    pub use crate::infra::postgres::PgStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

//! Audit Event Sink
//!
//! Structured observer for domain events: every orchestrator outcome,
//! success or failure, is mirrored onto the sink before the response is
//! sent. The sink is the sole observability hook of the core; it is
//! injected explicitly, never registered globally.

use crate::error::{AuthError, AuthResult};

/// A single audit record: method name, outcome text, status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Orchestrator method that produced the event
    pub method: String,
    /// Human-readable outcome
    pub response: String,
    /// HTTP status code of the outcome
    pub code: u16,
}

impl AuditEvent {
    /// Successful outcome (200)
    pub fn success(method: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            response: response.into(),
            code: 200,
        }
    }

    /// Failed outcome, code taken from the error
    pub fn failure(method: impl Into<String>, error: &AuthError) -> Self {
        Self {
            method: method.into(),
            response: error.to_string(),
            code: error.status_code().as_u16(),
        }
    }
}

/// Audit sink capability.
///
/// Implementations must be cheap and non-blocking; recording must never
/// fail the request it describes.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Sink backed by the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "auth",
            method = %event.method,
            code = event.code,
            response = %event.response,
            "audit"
        );
    }
}

/// Mirror a use-case result onto the sink.
pub fn record_outcome<T>(
    sink: &dyn AuditSink,
    method: &'static str,
    result: &AuthResult<T>,
    success_response: &str,
) {
    match result {
        Ok(_) => sink.record(AuditEvent::success(method, success_response)),
        Err(e) => sink.record(AuditEvent::failure(method, e)),
    }
}

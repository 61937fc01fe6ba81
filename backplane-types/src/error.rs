//! The error taxonomy shared by every Backplane subsystem.

use thiserror::Error;

/// Result type for pipeline, hook and cache operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur across the mutation/query pipeline.
///
/// Every failure carries a stable kind and a human-readable message. Errors
/// are surfaced to the immediate caller unmodified; the only remapping in the
/// whole system is the session-missing translation the pipeline applies to
/// not-found/invalid-session failures on the user class.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A hook declaration is neither a valid function hook nor a valid
    /// class-trigger hook.
    #[error("invalid hook declaration: {0}")]
    InvalidHook(String),

    /// A hook with the same identity already exists.
    #[error("{0}")]
    HookAlreadyExists(String),

    /// No object matched the query (hook update, delete pre-image fetch,
    /// destroy target).
    #[error("{0}")]
    ObjectNotFound(String),

    /// The policy gate rejected the class/operation pair for this principal.
    #[error("{0}")]
    OperationForbidden(String),

    /// Session ownership check failed for a non-master delete.
    #[error("invalid session token")]
    InvalidSessionToken,

    /// Unauthenticated or bad-session mutation of the user class.
    #[error("{0}")]
    SessionMissing(String),

    /// A webhook response body could not be decoded as JSON. Carries the
    /// first 100 characters of the raw body for diagnostics.
    #[error("malformed webhook response: {partial}")]
    MalformedResponse { partial: String },

    /// A webhook response body explicitly reported an error.
    #[error("webhook error {code}: {message}")]
    Webhook { code: i64, message: String },

    /// Durable storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Cache-layer failure (schema cache or session cache backing store).
    #[error("cache error: {0}")]
    Cache(String),

    /// Outbound HTTP failure.
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns true for the not-found kind, used by the pipeline's
    /// session-missing remap on the user class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ObjectNotFound(_))
    }
}

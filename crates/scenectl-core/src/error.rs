//! Shared error taxonomy for the control plane core.
//!
//! Every fallible public function in the workspace returns `Result<T, CoreError>`.
//! `CoreError` maps 1:1 onto the symbolic `error_code` / HTTP status taxonomy every
//! HTTP and MCP caller observes; `error_code()` and `http_status()` are the only
//! places that mapping is allowed to live.

use serde_json::Value;

/// The control plane's error taxonomy.
///
/// Variants are grouped the way callers reason about them (input, auth,
/// transport, backpressure, resource, security, domain) rather than by
/// originating module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("validation failed for `{field}`: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required parameter `{field}`")]
    MissingParameter { field: String },

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("empty response from controller")]
    EmptyResponse,

    #[error("invalid response shape: {type_name}")]
    InvalidResponse { type_name: String },

    #[error("no route for {method} {path}")]
    NoRoute { method: String, path: String },

    #[error("unknown MCP tool `{tool}`")]
    UnknownTool { tool: String },

    #[error("connection error: {reason}")]
    ConnectionError { reason: String },

    #[error("request timed out after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    #[error("rate limited")]
    RateLimited,

    #[error("queue `{channel}` is full")]
    QueueFull { channel: String },

    #[error("service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("command injection attempt rejected: {token}")]
    CommandInjection { token: String },

    #[error("path traversal attempt rejected: {path}")]
    PathTraversal { path: String },

    #[error("operation `{operation}` failed: {reason}")]
    DomainFailed { operation: String, reason: String },
}

impl CoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn missing_parameter(field: impl Into<String>) -> Self {
        Self::MissingParameter { field: field.into() }
    }

    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { field: field.into(), reason: reason.into() }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized { reason: reason.into() }
    }

    pub fn domain_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DomainFailed { operation: operation.into(), reason: reason.into() }
    }

    pub fn queue_full(channel: impl Into<String>) -> Self {
        Self::QueueFull { channel: channel.into() }
    }

    /// The symbolic `error_code` string carried in every `ErrorEnvelope`.
    pub fn error_code(&self) -> String {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR".to_string(),
            Self::MissingParameter { .. } => "MISSING_PARAMETER".to_string(),
            Self::InvalidParameter { .. } => "INVALID_PARAMETER".to_string(),
            Self::Unauthorized { .. } => "UNAUTHORIZED".to_string(),
            Self::Forbidden { .. } => "FORBIDDEN".to_string(),
            Self::EmptyResponse => "EMPTY_RESPONSE".to_string(),
            Self::InvalidResponse { .. } => "INVALID_RESPONSE".to_string(),
            Self::NoRoute { .. } => "NO_ROUTE".to_string(),
            Self::UnknownTool { .. } => "UNKNOWN_TOOL".to_string(),
            Self::ConnectionError { .. } => "CONNECTION_ERROR".to_string(),
            Self::RequestTimeout { .. } => "REQUEST_TIMEOUT".to_string(),
            Self::RateLimited => "RATE_LIMITED".to_string(),
            Self::QueueFull { .. } => "QUEUE_FULL".to_string(),
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE".to_string(),
            Self::NotFound { .. } => "NOT_FOUND".to_string(),
            Self::GroupNotFound { .. } => "GROUP_NOT_FOUND".to_string(),
            Self::CommandInjection { .. } => "COMMAND_INJECTION".to_string(),
            Self::PathTraversal { .. } => "PATH_TRAVERSAL".to_string(),
            Self::DomainFailed { operation, .. } => format!("{}_FAILED", operation.to_uppercase()),
        }
    }

    /// The HTTP status code this error maps to, per the §6 table.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::MissingParameter { .. } | Self::InvalidParameter { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } | Self::GroupNotFound { .. } | Self::NoRoute { .. } | Self::UnknownTool { .. } => 404,
            Self::RequestTimeout { .. } => 408,
            Self::RateLimited => 429,
            Self::QueueFull { .. } | Self::ServiceUnavailable { .. } => 503,
            Self::CommandInjection { .. } | Self::PathTraversal { .. } => 400,
            Self::EmptyResponse | Self::InvalidResponse { .. } | Self::ConnectionError { .. } | Self::DomainFailed { .. } => 500,
        }
    }

    /// Whether a caller may retry this error unchanged (no state needs correcting).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::QueueFull { .. }
                | Self::ServiceUnavailable { .. }
                | Self::RequestTimeout { .. }
                | Self::ConnectionError { .. }
        )
    }

    /// Structured `details` payload, when the taxonomy defines one.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Validation { field, .. }
            | Self::MissingParameter { field }
            | Self::InvalidParameter { field, .. } => Some(serde_json::json!({ "parameter": field })),
            Self::InvalidResponse { type_name } => Some(serde_json::json!({ "type": type_name })),
            Self::GroupNotFound { group_id } => Some(serde_json::json!({ "group_id": group_id })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_stable_code_and_status() {
        let cases: Vec<(CoreError, &str, u16)> = vec![
            (CoreError::validation("position", "wrong length"), "VALIDATION_ERROR", 400),
            (CoreError::missing_parameter("name"), "MISSING_PARAMETER", 400),
            (CoreError::invalid_parameter("fps", "out of range"), "INVALID_PARAMETER", 400),
            (CoreError::unauthorized("bad signature"), "UNAUTHORIZED", 401),
            (CoreError::Forbidden { reason: "x".into() }, "FORBIDDEN", 403),
            (CoreError::EmptyResponse, "EMPTY_RESPONSE", 500),
            (CoreError::InvalidResponse { type_name: "str".into() }, "INVALID_RESPONSE", 500),
            (CoreError::NoRoute { method: "GET".into(), path: "/x".into() }, "NO_ROUTE", 404),
            (CoreError::UnknownTool { tool: "t".into() }, "UNKNOWN_TOOL", 404),
            (CoreError::ConnectionError { reason: "x".into() }, "CONNECTION_ERROR", 500),
            (CoreError::RequestTimeout { timeout_ms: 100 }, "REQUEST_TIMEOUT", 408),
            (CoreError::RateLimited, "RATE_LIMITED", 429),
            (CoreError::queue_full("elements"), "QUEUE_FULL", 503),
            (CoreError::ServiceUnavailable { reason: "x".into() }, "SERVICE_UNAVAILABLE", 503),
            (CoreError::NotFound { what: "id".into() }, "NOT_FOUND", 404),
            (CoreError::GroupNotFound { group_id: "g1".into() }, "GROUP_NOT_FOUND", 404),
            (CoreError::CommandInjection { token: ";rm".into() }, "COMMAND_INJECTION", 400),
            (CoreError::PathTraversal { path: "../x".into() }, "PATH_TRAVERSAL", 400),
            (CoreError::domain_failed("add_element", "scene busy"), "ADD_ELEMENT_FAILED", 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.error_code(), code);
            assert_eq!(err.http_status(), status);
        }
    }

    #[test]
    fn backpressure_errors_are_retryable() {
        assert!(CoreError::RateLimited.is_retryable());
        assert!(CoreError::queue_full("assets").is_retryable());
        assert!(!CoreError::unauthorized("no").is_retryable());
    }
}

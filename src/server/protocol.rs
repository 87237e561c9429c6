//! Protocol types for the WebSocket API
//!
//! Request/response envelopes, error codes and the `system.info` payload.

use crate::error::ConsoleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Request Types
// =============================================================================

/// Request envelope sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    /// Optional request correlation ID (client may omit; server generates and echoes)
    #[serde(default)]
    pub id: Option<String>,

    /// Method to call (e.g., "schema.create")
    pub method: String,

    /// Method-specific parameters
    #[serde(default)]
    pub params: Value,
}

// =============================================================================
// Response Types
// =============================================================================

/// Response envelope sent by the server; exactly one per request
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    /// Request correlation ID (client-provided or server-generated)
    pub id: String,

    #[serde(rename = "type")]
    pub response_type: ResponseType,

    pub data: Value,
}

impl ResponseEnvelope {
    pub fn result(id: String, data: impl Serialize) -> Self {
        Self {
            id,
            response_type: ResponseType::Result,
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    pub fn error(id: String, error: ErrorData) -> Self {
        Self {
            id,
            response_type: ResponseType::Error,
            data: serde_json::to_value(error).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Result,
    Error,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorData {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(
            ErrorCode::UnknownMethod,
            format!("Unknown method: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request message
    InvalidRequest,
    UnknownMethod,
    /// Parameters did not deserialize
    InvalidParams,
    /// Input rejected by the console's validation
    ValidationFailed,
    /// Query text rejected by the read-only policy
    PolicyViolation,
    AuthFailed,
    SqlExecutionFailed,
    Timeout,
    InternalError,
}

impl From<&ConsoleError> for ErrorCode {
    fn from(err: &ConsoleError) -> Self {
        match err {
            ConsoleError::Validation { .. } => ErrorCode::ValidationFailed,
            ConsoleError::PolicyViolation(_) => ErrorCode::PolicyViolation,
            ConsoleError::Auth(_) => ErrorCode::AuthFailed,
            ConsoleError::SqlExecution(_) => ErrorCode::SqlExecutionFailed,
            ConsoleError::Timeout { .. } => ErrorCode::Timeout,
            ConsoleError::Inference(_) | ConsoleError::FatalLoad(_) => ErrorCode::InternalError,
        }
    }
}

// =============================================================================
// System Info Types
// =============================================================================

/// `system.info` response
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub protocol_version: u32,
    pub server_version: String,
    pub build: BuildInfo,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub git_sha: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureFlags {
    /// Whether `admin.login` can ever succeed on this server
    pub admin_enabled: bool,
}

impl SystemInfo {
    pub fn new(admin_enabled: bool) -> Self {
        Self {
            protocol_version: 1,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            build: BuildInfo {
                git_sha: option_env!("GIT_SHA").unwrap_or("unknown").to_string(),
                timestamp: option_env!("BUILD_TIMESTAMP")
                    .unwrap_or("unknown")
                    .to_string(),
            },
            features: FeatureFlags { admin_enabled },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_deserialization() {
        let json = r#"{"id": "req-1", "method": "query.run", "params": {"sql": "select 1"}}"#;
        let req: RequestEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(req.id, Some("req-1".to_string()));
        assert_eq!(req.method, "query.run");

        let json = r#"{"method": "schema.tables"}"#;
        let req: RequestEnvelope = serde_json::from_str(json).unwrap();
        assert!(req.id.is_none());
        assert!(req.params.is_null());
    }

    #[test]
    fn test_response_envelope_serialization() {
        let resp = ResponseEnvelope::result("req-1".to_string(), serde_json::json!({"a": 1}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"id\":\"req-1\""));
        assert!(json.contains("\"type\":\"result\""));

        let resp = ResponseEnvelope::error("req-2".to_string(), ErrorData::unknown_method("x.y"));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"code\":\"UNKNOWN_METHOD\""));
    }

    #[test]
    fn test_console_error_codes() {
        let cases = [
            (ConsoleError::validation("f", "m"), "\"VALIDATION_FAILED\""),
            (ConsoleError::PolicyViolation("p".into()), "\"POLICY_VIOLATION\""),
            (ConsoleError::Auth("a".into()), "\"AUTH_FAILED\""),
            (ConsoleError::SqlExecution("s".into()), "\"SQL_EXECUTION_FAILED\""),
            (
                ConsoleError::timeout("query", std::time::Duration::from_secs(1)),
                "\"TIMEOUT\"",
            ),
            (ConsoleError::Inference("i".into()), "\"INTERNAL_ERROR\""),
        ];
        for (err, expected) in cases {
            let code = ErrorCode::from(&err);
            assert_eq!(serde_json::to_string(&code).unwrap(), expected);
        }
    }

    #[test]
    fn test_system_info() {
        let info = SystemInfo::new(false);
        assert_eq!(info.protocol_version, 1);
        assert!(!info.features.admin_enabled);
    }
}

//! Wire-level errors a node reports instead of a payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PROTOCOL_MAX, PROTOCOL_MIN};

/// Stable error registry; the wire spelling is the `SCREAMING_SNAKE_CASE` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedProtocol,
    UnknownOperation,
    JobNotFound,
    /// Node refused the request under load
    Busy,
    Internal,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::UnsupportedProtocol => "UNSUPPORTED_PROTOCOL",
            ErrorCode::UnknownOperation => "UNKNOWN_OPERATION",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::Busy => "BUSY",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `error` member of a failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    /// Structured details, always an object when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach one detail under `data`
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        let data = self.data.get_or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(details) = data {
            details.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unsupported_protocol(requested: i32) -> Self {
        Self::new(
            ErrorCode::UnsupportedProtocol,
            format!("protocol_version {} not in {}..={}", requested, PROTOCOL_MIN, PROTOCOL_MAX),
        )
        .with_detail("requested", requested)
        .with_detail("min", PROTOCOL_MIN)
        .with_detail("max", PROTOCOL_MAX)
    }

    pub fn unknown_operation(op: &str) -> Self {
        Self::new(ErrorCode::UnknownOperation, format!("unknown operation: {}", op)).with_detail("op", op)
    }

    pub fn job_not_found(job_id: &str) -> Self {
        Self::new(ErrorCode::JobNotFound, format!("job '{}' not found", job_id)).with_detail("job_id", job_id)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

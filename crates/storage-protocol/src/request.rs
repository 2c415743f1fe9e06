//! RPC request types.

use serde::{Deserialize, Serialize};

/// RPC request envelope.
///
/// A node accepts a single JSON request on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version the host speaks.
    pub protocol_version: i32,
    /// Operation name (see [`crate::ops::names`]).
    pub op: String,
    /// Caller-chosen request ID for correlation.
    pub request_id: String,
    /// Operation-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RpcRequest {
    /// Build a request for `op` with a serializable payload.
    pub fn new<P: Serialize>(
        protocol_version: i32,
        op: impl Into<String>,
        request_id: impl Into<String>,
        payload: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            protocol_version,
            op: op.into(),
            request_id: request_id.into(),
            payload: serde_json::to_value(payload)?,
        })
    }
}

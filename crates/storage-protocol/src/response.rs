//! Response envelope: `{protocol_version, request_id, ok, payload | error}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::request::RpcRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub protocol_version: i32,
    /// Must equal the request's id
    pub request_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Answer `request`, echoing its version and id
    pub fn reply(request: &RpcRequest, outcome: Result<Value, RpcError>) -> Self {
        let (ok, payload, error) = match outcome {
            Ok(payload) => (true, Some(payload), None),
            Err(error) => (false, None, Some(error)),
        };

        Self {
            protocol_version: request.protocol_version,
            request_id: request.request_id.clone(),
            ok,
            payload,
            error,
        }
    }

    /// The node's answer. `Ok(None)` is a success that carried no payload.
    pub fn into_outcome(self) -> Result<Option<Value>, RpcError> {
        if self.ok {
            return Ok(self.payload);
        }
        Err(self
            .error
            .unwrap_or_else(|| RpcError::internal("node reported failure without error details")))
    }
}

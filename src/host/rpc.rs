//! Host RPC Client
//!
//! One `NodeClient` per storage node. Issues `get_job` requests through a
//! [`Transport`] and maps error responses onto [`NodeError`]. There is no
//! retry logic here: a failed query is reported once and the caller decides.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use storage_protocol::ops::names;
use storage_protocol::{ErrorCode, GetJobRequest, RpcError, RpcRequest, PROTOCOL_MAX};

use super::transport::{Transport, TransportError};
use crate::job::{JobRecord, JobSource};

/// Node client errors
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Node incompatible: {0}")]
    Incompatible(String),

    #[error("Node busy: {0}")]
    Busy(String),

    #[error("Node error: {0}")]
    Remote(RpcError),
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Host-side client for a single storage node
pub struct NodeClient {
    name: String,
    transport: Arc<dyn Transport>,
    request_counter: AtomicU64,
}

impl NodeClient {
    /// Create a client for the node called `name`
    pub fn new(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            transport,
            request_counter: AtomicU64::new(0),
        }
    }

    /// Inventory name of the node this client talks to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport endpoint, for logs and listings
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    fn next_request_id(&self) -> String {
        let counter = self.request_counter.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!("req-{:x}-{:08x}", timestamp, counter)
    }

    fn map_error(error: RpcError, job_id: &str) -> NodeError {
        match error.code {
            ErrorCode::JobNotFound => NodeError::JobNotFound { job_id: job_id.to_string() },
            ErrorCode::InvalidRequest => NodeError::InvalidRequest(error.message),
            ErrorCode::UnsupportedProtocol | ErrorCode::UnknownOperation => {
                NodeError::Incompatible(error.message)
            }
            ErrorCode::Busy => NodeError::Busy(error.message),
            ErrorCode::Internal => NodeError::Remote(error),
        }
    }

    /// Get the current record for a job
    pub fn get_job(&self, job_id: &str) -> NodeResult<JobRecord> {
        let request = RpcRequest::new(
            PROTOCOL_MAX,
            names::GET_JOB,
            self.next_request_id(),
            &GetJobRequest::new(job_id),
        )
        .map_err(|e| NodeError::Protocol(format!("Failed to encode get_job request: {}", e)))?;

        tracing::debug!(node = %self.name, job_id, request_id = %request.request_id, "querying job");

        let response = self.transport.execute(&request)?;

        if response.request_id != request.request_id {
            return Err(NodeError::Protocol(format!(
                "Response request_id '{}' does not match '{}'",
                response.request_id, request.request_id
            )));
        }

        match response.into_outcome() {
            Ok(Some(payload)) => Ok(JobRecord::new(payload)),
            Ok(None) => Err(NodeError::Protocol("get_job response missing payload".to_string())),
            Err(error) => Err(Self::map_error(error, job_id)),
        }
    }
}

impl JobSource for NodeClient {
    type Record = JobRecord;
    type Error = NodeError;

    fn get_job(&self, job_id: &str) -> Result<JobRecord, NodeError> {
        NodeClient::get_job(self, job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::transport::MockTransport;
    use crate::mock::{FailureConfig, MockNode};
    use serde_json::json;
    use storage_protocol::RpcResponse;

    fn client_for(node: &MockNode) -> NodeClient {
        NodeClient::new("mock-1", Arc::new(MockTransport::with_node(node.clone())))
    }

    /// Transport returning a canned response, optionally echoing the request id
    struct CannedTransport {
        response: RpcResponse,
        echo_id: bool,
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
            let mut response = self.response.clone();
            if self.echo_id {
                response.request_id = request.request_id.clone();
            }
            Ok(response)
        }

        fn endpoint(&self) -> String {
            "canned".to_string()
        }
    }

    #[test]
    fn test_get_job_success() {
        let node = MockNode::new();
        node.insert_job("j1", json!({"id": "j1", "state": "RUNNING", "attempts": 2}));

        let record = client_for(&node).get_job("j1").unwrap();
        assert_eq!(record.get("state"), Some(&json!("RUNNING")));
        assert_eq!(record.get("attempts"), Some(&json!(2)));
    }

    #[test]
    fn test_get_job_not_found() {
        let node = MockNode::new();

        let result = client_for(&node).get_job("nope");
        assert!(matches!(result, Err(NodeError::JobNotFound { ref job_id }) if job_id == "nope"));
    }

    #[test]
    fn test_get_job_busy_is_not_retried() {
        let node = MockNode::new();
        node.insert_job("j1", json!({"id": "j1"}));
        node.inject_failure(names::GET_JOB, FailureConfig::error(ErrorCode::Busy, "overloaded"));

        let result = client_for(&node).get_job("j1");
        assert!(matches!(result, Err(NodeError::Busy(_))));
        assert_eq!(node.request_count(), 1);
    }

    #[test]
    fn test_internal_error_keeps_rpc_error() {
        let node = MockNode::new();
        node.inject_failure(names::GET_JOB, FailureConfig::error(ErrorCode::Internal, "disk gone"));

        let err = client_for(&node).get_job("j1").unwrap_err();
        assert!(matches!(err, NodeError::Remote(ref e) if e.message == "disk gone"));
        assert_eq!(err.to_string(), "Node error: INTERNAL: disk gone");
    }

    #[test]
    fn test_missing_payload_is_protocol_error() {
        let transport = CannedTransport {
            response: RpcResponse {
                protocol_version: 1,
                request_id: String::new(),
                ok: true,
                payload: None,
                error: None,
            },
            echo_id: true,
        };
        let client = NodeClient::new("canned", Arc::new(transport));

        let err = client.get_job("j1").unwrap_err();
        assert!(matches!(err, NodeError::Protocol(ref m) if m.contains("missing payload")));
    }

    #[test]
    fn test_error_without_details_is_remote_error() {
        let transport = CannedTransport {
            response: RpcResponse {
                protocol_version: 1,
                request_id: String::new(),
                ok: false,
                payload: None,
                error: None,
            },
            echo_id: true,
        };
        let client = NodeClient::new("canned", Arc::new(transport));

        assert!(matches!(client.get_job("j1"), Err(NodeError::Remote(_))));
    }

    #[test]
    fn test_mismatched_request_id_rejected() {
        let transport = CannedTransport {
            response: RpcResponse {
                protocol_version: 1,
                request_id: "someone-else".to_string(),
                ok: true,
                payload: Some(json!({})),
                error: None,
            },
            echo_id: false,
        };
        let client = NodeClient::new("canned", Arc::new(transport));

        let err = client.get_job("j1").unwrap_err();
        assert!(matches!(err, NodeError::Protocol(ref m) if m.contains("someone-else")));
    }

    #[test]
    fn test_request_id_generation() {
        let client = client_for(&MockNode::new());

        let id1 = client.next_request_id();
        let id2 = client.next_request_id();

        assert_ne!(id1, id2);
        assert!(id1.starts_with("req-"));
    }

    #[test]
    fn test_name_and_endpoint() {
        let client = client_for(&MockNode::new());
        assert_eq!(client.name(), "mock-1");
        assert_eq!(client.endpoint(), "mock");
    }
}

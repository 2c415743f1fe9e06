//! Mock Node Implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};
use storage_protocol::ops::names;
use storage_protocol::{GetJobRequest, RpcError, RpcRequest, RpcResponse, PROTOCOL_MAX, PROTOCOL_MIN};

use super::failure::{FailureConfig, FailureInjector};

/// Configurable mock node for testing
///
/// Cloning shares state, so a test can keep a handle after moving a clone
/// into a transport.
#[derive(Clone, Default)]
pub struct MockNode {
    jobs: Arc<Mutex<HashMap<String, Value>>>,
    failures: Arc<Mutex<FailureInjector>>,
    requests: Arc<AtomicUsize>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    // === Public API for test configuration ===

    /// Store a job record exactly as the node should return it
    pub fn insert_job(&self, job_id: &str, record: Value) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job_id.to_string(), record);
    }

    /// Store a freshly created job in the given state
    pub fn create_job(&self, job_id: &str, state: &str) {
        let now = Utc::now().to_rfc3339();
        self.insert_job(
            job_id,
            json!({
                "id": job_id,
                "state": state,
                "attempts": 0,
                "created_at": now,
                "updated_at": now,
            }),
        );
    }

    /// Inject an error for an operation
    pub fn inject_failure(&self, op: &str, config: FailureConfig) {
        let mut failures = self.failures.lock().unwrap();
        failures.inject(op, config);
    }

    /// Number of requests this node has handled
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    // === Request handling ===

    /// Handle an RPC request (in-process library mode)
    pub fn handle_request(&self, request: &RpcRequest) -> RpcResponse {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let failure = self.failures.lock().unwrap().check(&request.op);

        let outcome = if let Some(failure) = failure {
            Err(RpcError::new(failure.code, failure.message))
        } else if !(PROTOCOL_MIN..=PROTOCOL_MAX).contains(&request.protocol_version) {
            Err(RpcError::unsupported_protocol(request.protocol_version))
        } else {
            match request.op.as_str() {
                names::GET_JOB => self.handle_get_job(&request.payload),
                other => Err(RpcError::unknown_operation(other)),
            }
        };

        RpcResponse::reply(request, outcome)
    }

    fn handle_get_job(&self, payload: &Value) -> Result<Value, RpcError> {
        let req: GetJobRequest = serde_json::from_value(payload.clone())
            .map_err(|e| RpcError::invalid_request(format!("invalid get_job payload: {}", e)))?;

        let jobs = self.jobs.lock().unwrap();
        jobs.get(&req.job_id)
            .cloned()
            .ok_or_else(|| RpcError::job_not_found(&req.job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_protocol::ErrorCode;

    fn get_job(job_id: &str) -> RpcRequest {
        RpcRequest::new(1, names::GET_JOB, "req-test", &GetJobRequest::new(job_id)).unwrap()
    }

    #[test]
    fn test_get_job_returns_stored_record() {
        let node = MockNode::new();
        node.insert_job("j1", json!({"id": "j1", "state": "RUNNING"}));

        let response = node.handle_request(&get_job("j1"));
        assert!(response.ok);
        assert_eq!(response.request_id, "req-test");
        assert_eq!(response.payload.unwrap()["state"], "RUNNING");
    }

    #[test]
    fn test_get_job_unknown_id() {
        let node = MockNode::new();

        let response = node.handle_request(&get_job("missing"));
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().code, ErrorCode::JobNotFound);
    }

    #[test]
    fn test_create_job_sets_state_and_timestamps() {
        let node = MockNode::new();
        node.create_job("j2", "QUEUED");

        let payload = node.handle_request(&get_job("j2")).payload.unwrap();
        assert_eq!(payload["state"], "QUEUED");
        assert!(payload["created_at"].is_string());
    }

    #[test]
    fn test_missing_job_id_is_invalid_request() {
        let node = MockNode::new();
        let request = RpcRequest {
            protocol_version: 1,
            op: names::GET_JOB.to_string(),
            request_id: "r".to_string(),
            payload: json!({}),
        };

        let response = node.handle_request(&request);
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_unsupported_protocol_version() {
        let node = MockNode::new();
        let mut request = get_job("j1");
        request.protocol_version = 7;

        let response = node.handle_request(&request);
        assert_eq!(response.error.unwrap().code, ErrorCode::UnsupportedProtocol);
    }

    #[test]
    fn test_unknown_operation() {
        let node = MockNode::new();
        let request = RpcRequest {
            protocol_version: 1,
            op: "delete_job".to_string(),
            request_id: "r".to_string(),
            payload: json!({}),
        };

        let response = node.handle_request(&request);
        assert_eq!(response.error.unwrap().code, ErrorCode::UnknownOperation);
    }

    #[test]
    fn test_injected_failure_and_request_count() {
        let node = MockNode::new();
        node.insert_job("j1", json!({"id": "j1"}));
        node.inject_failure(
            names::GET_JOB,
            FailureConfig::error(ErrorCode::Busy, "overloaded").with_fail_count(1),
        );

        assert!(!node.handle_request(&get_job("j1")).ok);
        assert!(node.handle_request(&get_job("j1")).ok);
        assert_eq!(node.request_count(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let node = MockNode::new();
        let handle = node.clone();
        node.insert_job("j1", json!({"id": "j1"}));

        assert!(handle.handle_request(&get_job("j1")).ok);
        assert_eq!(node.request_count(), 1);
    }
}

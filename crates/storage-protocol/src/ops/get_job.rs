//! get_job operation types.
//!
//! Read-only lookup of a single job's current state. The response payload is
//! whatever record the node keeps for the job; the host never interprets it.

use serde::{Deserialize, Serialize};

/// get_job request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetJobRequest {
    /// The job ID to look up. Opaque to the host.
    pub job_id: String,
}

impl GetJobRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self { job_id: job_id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_job_request_shape() {
        let value = serde_json::to_value(GetJobRequest::new("j1")).unwrap();
        assert_eq!(value, serde_json::json!({"job_id": "j1"}));
    }

    #[test]
    fn test_get_job_request_rejects_missing_job_id() {
        let result: Result<GetJobRequest, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }
}

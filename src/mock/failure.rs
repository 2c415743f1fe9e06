//! Failure Injection for the Mock Node
//!
//! Supports configurable failure injection for testing error paths.

use std::collections::HashMap;

use storage_protocol::ErrorCode;

/// Failure configuration for an operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Error code to return
    pub code: ErrorCode,
    /// Error message to return
    pub message: String,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns an error
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock node, keyed by operation name
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<String, FailureConfig>,
    call_counts: HashMap<String, u32>,
}

impl FailureInjector {
    /// Inject a failure configuration for an operation
    pub fn inject(&mut self, op: &str, config: FailureConfig) {
        self.configs.insert(op.to_string(), config);
        self.call_counts.remove(op);
    }

    /// Check whether the current call to `op` should fail
    pub fn check(&mut self, op: &str) -> Option<FailureConfig> {
        let config = self.configs.get(op)?.clone();

        let count = self.call_counts.entry(op.to_string()).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(max) if *count > max => None,
            _ => Some(config),
        }
    }
}

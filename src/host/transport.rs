//! Transports
//!
//! A transport carries one request envelope to a node and brings one response
//! envelope back. In production that is a single ssh invocation:
//!
//! ```text
//! ssh -o BatchMode=yes ... -p <port> [-i <key>] <user>@<host> <remote_command>
//!   stdin:  {"protocol_version":1,"op":"get_job",...}\n
//!   stdout: {"protocol_version":1,"request_id":...,"ok":true,"payload":{...}}
//! ```
//!
//! Tests use [`MockTransport`], which answers from an in-process [`MockNode`].

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use storage_protocol::{RpcRequest, RpcResponse};

use crate::config::SshSettings;
use crate::inventory::NodeEntry;
use crate::mock::MockNode;

pub trait Transport: Send + Sync {
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError>;

    /// `user@host:port` or similar, for logs and listings
    fn endpoint(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to run ssh: {0}")]
    Spawn(#[source] io::Error),

    #[error("ssh to {endpoint} {detail}")]
    Ssh { endpoint: String, detail: String },

    #[error("Unreadable response from {endpoint}: {reason}")]
    Response { endpoint: String, reason: String },
}

/// Answers requests from a shared [`MockNode`] without leaving the process
pub struct MockTransport {
    node: MockNode,
}

impl MockTransport {
    pub fn with_node(node: MockNode) -> Self {
        Self { node }
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        Ok(self.node.handle_request(request))
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }
}

/// Everything needed to reach one node over ssh
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub key_path: Option<PathBuf>,
    pub remote_command: String,
    pub connect_timeout_seconds: u32,
    pub server_alive_interval: u32,
    pub server_alive_count_max: u32,
}

impl SshConfig {
    pub fn for_node(node: &NodeEntry, settings: &SshSettings) -> Self {
        Self {
            host: node.host.clone(),
            user: node.user.clone(),
            port: node.port,
            key_path: node.expanded_ssh_key_path(),
            remote_command: node.remote_command.clone(),
            connect_timeout_seconds: settings.connect_timeout_seconds,
            server_alive_interval: settings.server_alive_interval,
            server_alive_count_max: settings.server_alive_count_max,
        }
    }
}

pub struct SshTransport {
    config: SshConfig,
}

impl SshTransport {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let c = &self.config;
        let mut command = Command::new("ssh");

        // BatchMode: never prompt, a missing key is an error on stderr
        for option in [
            "BatchMode=yes".to_string(),
            format!("ConnectTimeout={}", c.connect_timeout_seconds),
            format!("ServerAliveInterval={}", c.server_alive_interval),
            format!("ServerAliveCountMax={}", c.server_alive_count_max),
        ] {
            command.arg("-o").arg(option);
        }

        command.arg("-p").arg(c.port.to_string());
        if let Some(ref key) = c.key_path {
            command.arg("-i").arg(key);
        }
        command.arg(format!("{}@{}", c.user, c.host)).arg(&c.remote_command);
        command
    }
}

impl Transport for SshTransport {
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        let endpoint = self.endpoint();
        let line = serde_json::to_string(request)?;

        tracing::debug!(endpoint = %endpoint, op = %request.op, request_id = %request.request_id, "sending request over ssh");

        let stdout = exchange(self.command(), &line, &endpoint)?;

        serde_json::from_slice(&stdout).map_err(|e| TransportError::Response {
            endpoint,
            reason: e.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}@{}:{}", self.config.user, self.config.host, self.config.port)
    }
}

/// Run `command`, feed it `line` plus a newline, and return its stdout.
///
/// The child is always reaped. Its stderr is attached to every failure,
/// including a request that could not be delivered.
fn exchange(mut command: Command, line: &str, endpoint: &str) -> Result<Vec<u8>, TransportError> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(TransportError::Spawn)?;

    // stdin is dropped after the write so the node sees EOF
    let delivered = match child.stdin.take() {
        Some(mut stdin) => writeln!(stdin, "{}", line),
        None => Ok(()),
    };

    let output = child.wait_with_output().map_err(TransportError::Spawn)?;

    let failure = match delivered {
        Err(e) => Some(format!("did not accept the request ({})", e)),
        Ok(()) if !output.status.success() => Some(format!("exited with {}", output.status)),
        Ok(()) => None,
    };

    match failure {
        None => Ok(output.stdout),
        Some(mut detail) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                detail.push_str(": ");
                detail.push_str(stderr.trim());
            }
            Err(TransportError::Ssh {
                endpoint: endpoint.to_string(),
                detail,
            })
        }
    }
}

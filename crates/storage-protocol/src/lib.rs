//! Storage Node Protocol Types
//!
//! Defines the JSON RPC envelope for host↔node communication.

pub mod error;
pub mod ops;
pub mod request;
pub mod response;

pub use error::{ErrorCode, RpcError};
pub use ops::get_job::GetJobRequest;
pub use request::RpcRequest;
pub use response::RpcResponse;

/// Minimum protocol version supported by this implementation.
pub const PROTOCOL_MIN: i32 = 1;

/// Maximum protocol version supported by this implementation.
pub const PROTOCOL_MAX: i32 = 1;

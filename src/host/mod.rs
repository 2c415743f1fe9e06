//! Host-Side Components
//!
//! Implements the host-side logic for talking to storage nodes: the
//! transport abstraction and the per-node RPC client.

pub mod rpc;
pub mod transport;

pub use rpc::{NodeClient, NodeError, NodeResult};
pub use transport::{MockTransport, SshConfig, SshTransport, Transport, TransportError};

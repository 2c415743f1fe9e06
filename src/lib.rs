//! storagectl - job inspection for storage node fleets
//!
//! This crate implements the host side of `storagectl`: it builds a fleet of
//! node clients from an inventory, picks one, asks it for a job's current
//! state over a JSON RPC envelope, and renders the record.

pub mod config;
pub mod fleet;
pub mod host;
pub mod inventory;
pub mod job;
pub mod logging;
pub mod lookup;
pub mod mock;
pub mod selection;

pub use config::{ConfigError, CtlConfig};
pub use fleet::{ClientFleet, FleetError, FleetInitializer, InventoryFleet};
pub use host::{MockTransport, NodeClient, NodeError, SshTransport, Transport};
pub use inventory::{InventoryError, NodeEntry, NodeInventory};
pub use job::{render, JobRecord, JobSource};
pub use lookup::{JobQuery, LookupError, NO_CLIENTS_MESSAGE};
pub use mock::MockNode;
pub use selection::{FirstClient, SelectionPolicy};
pub use storage_protocol::{ErrorCode, RpcError, RpcRequest, RpcResponse};

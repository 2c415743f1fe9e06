//! Node Inventory
//!
//! `~/.config/storagectl/nodes.toml` lists the storage nodes a fleet can be
//! built from, one `[[node]]` table each:
//!
//! ```toml
//! schema_version = 1
//!
//! [[node]]
//! name = "cn-eu"
//! host = "cn-eu.storage.internal"
//! tags = ["content"]
//! remote_command = "storage-node rpc"
//! ```
//!
//! Table order is fleet order. Unless `--by-priority` is given, the first
//! table is the node every lookup is sent to.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Inventory layout understood by this build
pub const SCHEMA_VERSION: u32 = 1;

/// Forced command that answers RPC envelopes on a node
pub const DEFAULT_REMOTE_COMMAND: &str = "storage-node rpc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInventory {
    #[serde(default = "NodeInventory::schema_default")]
    pub schema_version: u32,

    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeEntry>,
}

/// One `[[node]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    pub host: String,

    #[serde(default = "NodeEntry::port_default")]
    pub port: u16,

    #[serde(default = "NodeEntry::user_default")]
    pub user: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// `~/` is resolved against `$HOME` when the transport is built
    #[serde(default, alias = "identity_file")]
    pub ssh_key_path: Option<String>,

    /// Only consulted with `--by-priority`; lower sorts first
    #[serde(default = "NodeEntry::priority_default")]
    pub priority: i32,

    /// What ssh runs on the node. Usually pinned by a `command=` entry in
    /// the node's authorized_keys, in which case this is ignored remotely.
    #[serde(default = "NodeEntry::remote_command_default")]
    pub remote_command: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Inventory file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported inventory schema_version {found} (this build reads {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Node '{node}' is listed more than once")]
    DuplicateName { node: String },

    #[error("Node '{node}': {reason}")]
    Invalid { node: String, reason: String },

    #[error("HOME environment variable not set")]
    NoHome,
}

impl NodeInventory {
    fn schema_default() -> u32 {
        SCHEMA_VERSION
    }

    /// `~/.config/storagectl/nodes.toml`
    pub fn default_path() -> Result<PathBuf, InventoryError> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/storagectl/nodes.toml"))
            .ok_or(InventoryError::NoHome)
    }

    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.is_file() {
            return Err(InventoryError::NotFound(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn parse(content: &str) -> Result<Self, InventoryError> {
        let inventory: NodeInventory = toml::from_str(content)?;

        if inventory.schema_version != SCHEMA_VERSION {
            return Err(InventoryError::UnsupportedSchema {
                found: inventory.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut names = HashSet::new();
        for node in &inventory.nodes {
            if let Some(reason) = node.problem() {
                return Err(InventoryError::Invalid { node: node.name.clone(), reason });
            }
            if !names.insert(node.name.as_str()) {
                return Err(InventoryError::DuplicateName { node: node.name.clone() });
            }
        }

        Ok(inventory)
    }

    /// Nodes carrying every tag in `required`, in file order
    pub fn filter_by_tags(&self, required: &[&str]) -> Vec<&NodeEntry> {
        self.nodes.iter().filter(|node| node.has_tags(required)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeInventory {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            nodes: Vec::new(),
        }
    }
}

/// `--by-priority` order: priority, then name. Stable, so equal entries keep
/// their relative position.
pub fn sort_by_priority(nodes: &mut [&NodeEntry]) {
    nodes.sort_by(|a, b| (a.priority, &a.name).cmp(&(b.priority, &b.name)));
}

impl NodeEntry {
    fn port_default() -> u16 {
        22
    }

    fn user_default() -> String {
        "storage".to_string()
    }

    fn priority_default() -> i32 {
        100
    }

    fn remote_command_default() -> String {
        DEFAULT_REMOTE_COMMAND.to_string()
    }

    /// First reason this entry cannot become a fleet member
    fn problem(&self) -> Option<String> {
        let name_ok = !self.name.is_empty()
            && self.name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if !name_ok {
            Some("name must be non-empty and use only [A-Za-z0-9_-]".to_string())
        } else if self.host.trim().is_empty() {
            Some("host is empty".to_string())
        } else if self.port == 0 {
            Some("port 0 is not a valid ssh port".to_string())
        } else if self.user.trim().is_empty() {
            Some("user is empty".to_string())
        } else if self.remote_command.trim().is_empty() {
            Some("remote_command is empty".to_string())
        } else {
            None
        }
    }

    pub fn has_tags(&self, required: &[&str]) -> bool {
        required.iter().all(|tag| self.tags.iter().any(|t| t == tag))
    }

    pub fn expanded_ssh_key_path(&self) -> Option<PathBuf> {
        let raw = self.ssh_key_path.as_deref()?;
        match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
            (Some(rest), Some(home)) => Some(PathBuf::from(home).join(rest)),
            _ => Some(PathBuf::from(raw)),
        }
    }
}

//! Client Fleet
//!
//! A fleet is the ordered, non-empty set of node clients available to one
//! command invocation. It is built fresh per invocation by a
//! [`FleetInitializer`] and handed to the lookup path explicitly.
//!
//! Fleet order:
//! 1. Inventory file order by default
//! 2. Priority then name when `by_priority` is set
//! 3. Nodes missing any required tag are dropped first

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CtlConfig, SshSettings};
use crate::host::{NodeClient, SshConfig, SshTransport};
use crate::inventory::{sort_by_priority, InventoryError, NodeEntry, NodeInventory};
use crate::job::JobSource;
use crate::selection::SelectionPolicy;

/// Fleet construction errors
///
/// The lookup path treats every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("Failed to load node inventory: {0}")]
    Inventory(#[from] InventoryError),

    #[error("No nodes configured")]
    Empty,

    #[error("No nodes have required tags: {tags:?}")]
    NoTagMatch { tags: Vec<String> },

    #[error("Configuration unusable: {0}")]
    Config(String),
}

/// Ordered, non-empty collection of clients
#[derive(Debug)]
pub struct ClientFleet<C> {
    clients: Vec<C>,
}

#[allow(clippy::len_without_is_empty)]
impl<C> ClientFleet<C> {
    /// Build a fleet; an empty list is an error, not an empty fleet
    pub fn new(clients: Vec<C>) -> Result<Self, FleetError> {
        if clients.is_empty() {
            return Err(FleetError::Empty);
        }
        Ok(Self { clients })
    }

    /// Number of clients (always ≥ 1)
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// The default query target
    pub fn first(&self) -> &C {
        &self.clients[0]
    }

    /// Pick one client using `policy`, falling back to the first client
    /// when the policy returns an out-of-range index
    pub fn select<P: SelectionPolicy + ?Sized>(&self, policy: &P) -> &C {
        let index = policy.select(self.len());
        match self.clients.get(index) {
            Some(client) => {
                tracing::debug!(policy = policy.name(), index, fleet_len = self.len(), "selected client");
                client
            }
            None => {
                tracing::debug!(policy = policy.name(), index, fleet_len = self.len(), "selection out of range, using first client");
                self.first()
            }
        }
    }
}

/// Produces the fleet for one invocation
pub trait FleetInitializer {
    type Client: JobSource;

    fn initialize(&self) -> Result<ClientFleet<Self::Client>, FleetError>;
}

impl<F, C> FleetInitializer for F
where
    F: Fn() -> Result<ClientFleet<C>, FleetError>,
    C: JobSource,
{
    type Client = C;

    fn initialize(&self) -> Result<ClientFleet<C>, FleetError> {
        self()
    }
}

/// Builds the fleet from the node inventory, one SSH-backed client per node
#[derive(Debug, Clone)]
pub struct InventoryFleet {
    /// Inventory file; the default location when None
    pub inventory_path: Option<PathBuf>,
    /// Tags every node must carry
    pub required_tags: Vec<String>,
    /// Order by priority then name instead of file order
    pub by_priority: bool,
    pub ssh: SshSettings,
}

impl InventoryFleet {
    pub fn from_config(config: &CtlConfig) -> Self {
        Self {
            inventory_path: config.inventory_path.clone(),
            required_tags: config.required_tags.clone(),
            by_priority: config.by_priority,
            ssh: config.ssh.clone(),
        }
    }

    /// Load the inventory this initializer points at
    pub fn load_inventory(&self) -> Result<NodeInventory, InventoryError> {
        match self.inventory_path {
            Some(ref path) => NodeInventory::load(path),
            None => NodeInventory::load(&NodeInventory::default_path()?),
        }
    }

    /// Filter and order inventory entries into fleet order
    pub fn order_nodes<'a>(&self, inventory: &'a NodeInventory) -> Result<Vec<&'a NodeEntry>, FleetError> {
        if inventory.is_empty() {
            return Err(FleetError::Empty);
        }

        let tag_refs: Vec<&str> = self.required_tags.iter().map(String::as_str).collect();
        let mut nodes = inventory.filter_by_tags(&tag_refs);
        if nodes.is_empty() {
            return Err(FleetError::NoTagMatch { tags: self.required_tags.clone() });
        }

        if self.by_priority {
            sort_by_priority(&mut nodes);
        }

        Ok(nodes)
    }

}

impl FleetInitializer for InventoryFleet {
    type Client = NodeClient;

    fn initialize(&self) -> Result<ClientFleet<NodeClient>, FleetError> {
        let inventory = self.load_inventory()?;
        let nodes = self.order_nodes(&inventory)?;

        let clients: Vec<NodeClient> = nodes
            .into_iter()
            .map(|node| {
                let transport = SshTransport::new(SshConfig::for_node(node, &self.ssh));
                NodeClient::new(node.name.clone(), Arc::new(transport))
            })
            .collect();

        tracing::debug!(count = clients.len(), "built client fleet from inventory");
        ClientFleet::new(clients)
    }
}

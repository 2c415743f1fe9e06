//! Client Selection Policy
//!
//! Decides which fleet member answers a query. The default policy,
//! [`FirstClient`], always picks index 0: no load balancing, no health
//! check, no fallback to other nodes. Other policies can be plugged in
//! without touching the lookup path.

/// Strategy for picking one client out of a fleet
pub trait SelectionPolicy {
    /// Index of the client to query, given the fleet length (always ≥ 1).
    ///
    /// An out-of-range index is treated as 0 by the fleet.
    fn select(&self, fleet_len: usize) -> usize;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

/// Always query the first client in the fleet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstClient;

impl SelectionPolicy for FirstClient {
    fn select(&self, _fleet_len: usize) -> usize {
        0
    }

    fn name(&self) -> &str {
        "first"
    }
}

impl<F> SelectionPolicy for F
where
    F: Fn(usize) -> usize,
{
    fn select(&self, fleet_len: usize) -> usize {
        self(fleet_len)
    }
}

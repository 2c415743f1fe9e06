//! Mock Storage Node
//!
//! In-process stand-in for a storage node, used by tests to exercise the
//! host-side client and the job lookup path without SSH.
//!
//! # Operations
//!
//! - `get_job`: Return the stored record for a job, or `JOB_NOT_FOUND`
//!
//! Any other operation is answered with `UNKNOWN_OPERATION`.

mod failure;
mod node;

pub use failure::{FailureConfig, FailureInjector};
pub use node::MockNode;

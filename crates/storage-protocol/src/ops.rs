//! Operation-specific types.

pub mod get_job;

/// Known operation names.
pub mod names {
    pub const GET_JOB: &str = "get_job";
}

//! Job Lookup
//!
//! Orchestrates one job query: build the fleet, pick a client, ask it for the
//! job, and print the record.
//!
//! ```text
//! Start → FleetInit ─┬─ NoClients ───────────────────────────────→ End
//!                    └─ HasClients → Query ─┬─ QueryError ────────→ End
//!                                           └─ QuerySuccess → Serialize ─┬─ SerializeError → End
//!                                                                        └─ Print ─────────→ End
//! ```
//!
//! Every path ends after at most one query. Nothing is retried.
//!
//! Output contract (exactly one of):
//! - the indented record followed by a newline
//! - `Couldn't find any clients`
//! - `getting job error, <error>` on a single line
//! - nothing (no job ID, or the record could not be rendered)

use std::io::{self, Write};

use crate::fleet::{FleetError, FleetInitializer};
use crate::job::{render, JobSource};
use crate::selection::{FirstClient, SelectionPolicy};

/// Printed when the fleet is unavailable
pub const NO_CLIENTS_MESSAGE: &str = "Couldn't find any clients";

/// Prefix of the query failure diagnostic
pub const QUERY_ERROR_PREFIX: &str = "getting job error";

/// Why a lookup ended without printing a record.
///
/// The lookup has already produced its user-facing output (or deliberately
/// none) by the time one of these is returned; callers use it for logging
/// and exit codes.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No job ID supplied")]
    MissingArgument,

    #[error("No clients available: {0}")]
    FleetUnavailable(#[source] FleetError),

    #[error("Query for job '{job_id}' failed: {source}")]
    QueryFailed {
        job_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to render job record: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl LookupError {
    /// Exit code used when strict exit codes are requested.
    ///
    /// A missing job ID stays a successful no-op.
    pub fn exit_code(&self) -> i32 {
        match self {
            LookupError::MissingArgument => 0,
            LookupError::Output(_) => 1,
            LookupError::FleetUnavailable(_) => 2,
            LookupError::QueryFailed { .. } => 3,
            LookupError::SerializationFailed(_) => 4,
        }
    }
}

/// Single-job query handler
pub struct JobQuery<I, P = FirstClient> {
    initializer: I,
    policy: P,
}

impl<I: FleetInitializer> JobQuery<I> {
    /// Handler using the default first-client policy
    pub fn new(initializer: I) -> Self {
        Self {
            initializer,
            policy: FirstClient,
        }
    }
}

impl<I: FleetInitializer, P: SelectionPolicy> JobQuery<I, P> {
    /// Replace the selection policy
    pub fn with_policy<Q: SelectionPolicy>(self, policy: Q) -> JobQuery<I, Q> {
        JobQuery {
            initializer: self.initializer,
            policy,
        }
    }

    /// Look up `job_id` and write the outcome to `out`.
    pub fn run<W: Write>(&self, job_id: Option<&str>, out: &mut W) -> Result<(), LookupError> {
        let job_id = match job_id {
            Some(id) => id,
            None => return Err(LookupError::MissingArgument),
        };

        let fleet = match self.initializer.initialize() {
            Ok(fleet) => fleet,
            Err(e) => {
                writeln!(out, "{}", NO_CLIENTS_MESSAGE)?;
                return Err(LookupError::FleetUnavailable(e));
            }
        };

        let client = fleet.select(&self.policy);

        let record = match client.get_job(job_id) {
            Ok(record) => record,
            Err(e) => {
                writeln!(out, "{}, {}", QUERY_ERROR_PREFIX, single_line(&e.to_string()))?;
                return Err(LookupError::QueryFailed {
                    job_id: job_id.to_string(),
                    source: Box::new(e),
                });
            }
        };

        let rendered = render(&record).map_err(LookupError::SerializationFailed)?;

        out.write_all(rendered.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Join the non-blank lines of `message` with "; ".
///
/// ssh stderr and remote error messages often span several lines.
fn single_line(message: &str) -> String {
    message
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

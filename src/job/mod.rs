//! Job Records
//!
//! A job record is whatever structured state a node reports for a job. The
//! host never defines or filters its fields; it only carries the tree from the
//! node to the terminal. Key order is kept exactly as the node sent it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured state of a job as reported by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRecord(Value);

impl JobRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for JobRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The single capability a client must offer: look up one job by ID.
///
/// The record type is left open so anything serializable can be rendered;
/// node clients return [`JobRecord`].
pub trait JobSource {
    type Record: Serialize;
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_job(&self, job_id: &str) -> Result<Self::Record, Self::Error>;
}

/// Render a record as indented JSON (two spaces per level, record key order).
///
/// No trailing newline; callers add it when printing.
pub fn render<T: Serialize + ?Sized>(record: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

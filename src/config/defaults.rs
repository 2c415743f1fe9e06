//! Built-in defaults (layer 1)

use serde_json::{json, Value};

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default SSH connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u32 = 30;

/// Built-in defaults as a mergeable layer
pub fn builtin_layer() -> Value {
    json!({
        "inventory": null,
        "tags": [],
        "by_priority": false,
        "strict_exit": false,
        "log": DEFAULT_LOG_FILTER,
        "ssh": {
            "connect_timeout_seconds": DEFAULT_CONNECT_TIMEOUT_SECONDS,
            "server_alive_interval": 15,
            "server_alive_count_max": 2
        }
    })
}

//! Cassette file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded session of port interactions, stored as YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Session name.
    pub name: String,
    /// When the session was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Git commit the session was recorded at, or `"unknown"`.
    pub commit: String,
    /// Recorded interactions in call order.
    pub interactions: Vec<Interaction>,
}

/// One recorded call through a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Global sequence number within the cassette.
    pub seq: u64,
    /// Port name, e.g. `"backend"`.
    pub port: String,
    /// Method name, e.g. `"generate_text"`.
    pub method: String,
    /// Serialized request.
    pub input: serde_json::Value,
    /// Serialized result using the `Ok`/`Err` JSON convention.
    pub output: serde_json::Value,
}

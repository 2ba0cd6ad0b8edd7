//! # Inbound Ports
//!
//! API trait defining what the Group Manager can do.

use serde::{Deserialize, Deserializer};

use crate::domain::{GroupResult, GroupState};

/// Parameters of `generateGroup`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GenerateGroupRequest {
    /// Creation time, decimal Unix seconds.
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    /// Hex node ids of the initial sealers.
    pub sealers: Vec<String>,
}

impl GenerateGroupRequest {
    /// Build a request.
    pub fn new(timestamp: impl Into<String>, sealers: Vec<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            sealers,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// Group lifecycle API - inbound port.
///
/// Group ids arrive as raw integers so range violations are reported as
/// `INVALID_PARAMS` by the implementation.
pub trait GroupLifecycleApi: Send + Sync {
    /// Create a group in the Stopped state.
    fn generate_group(&self, group_id: i64, request: &GenerateGroupRequest) -> GroupResult<()>;

    /// Start a Stopped group.
    fn start_group(&self, group_id: i64) -> GroupResult<()>;

    /// Stop a Running group.
    fn stop_group(&self, group_id: i64) -> GroupResult<()>;

    /// Soft-delete a Stopped group.
    fn remove_group(&self, group_id: i64) -> GroupResult<()>;

    /// Restore a Deleted group to Stopped.
    fn recover_group(&self, group_id: i64) -> GroupResult<()>;

    /// Current state of an existing group.
    fn query_group_status(&self, group_id: i64) -> GroupResult<GroupState>;
}

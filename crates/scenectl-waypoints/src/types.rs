//! Waypoint and group data shapes (§4.15, field names per the surveyor
//! tool surface: `position`, `waypoint_type`, `name`, `target`, `metadata`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub position: [f64; 3],
    pub waypoint_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How `WaypointStore::import` reconciles a bundle against existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Clears all existing waypoints and groups before importing.
    Replace,
    /// Imports every entry, overwriting any id collision.
    Merge,
    /// Imports only entries whose id is not already present.
    SkipExisting,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportBundle {
    pub waypoints: Vec<Waypoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub waypoints_imported: usize,
    pub waypoints_skipped: usize,
    pub groups_imported: usize,
    pub groups_skipped: usize,
}

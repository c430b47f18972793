//! `WaypointStore` (C15): an opaque, in-process ordered store of named
//! spatial waypoints and the group DAG they may belong to.

pub mod store;
pub mod types;

pub use store::WaypointStore;
pub use types::{ExportBundle, Group, ImportStats, MergeMode, Waypoint};

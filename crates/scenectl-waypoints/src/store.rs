//! `WaypointStore`: an ordered, in-process store of waypoints and the
//! group DAG they may belong to (§4.15).

use std::collections::HashMap;

use parking_lot::Mutex;
use scenectl_core::CoreError;
use serde_json::Value;

use crate::types::{ExportBundle, Group, ImportStats, MergeMode, Waypoint};

struct Inner {
    waypoint_order: Vec<String>,
    waypoints: HashMap<String, Waypoint>,
    group_order: Vec<String>,
    groups: HashMap<String, Group>,
}

pub struct WaypointStore {
    inner: Mutex<Inner>,
}

impl Default for WaypointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                waypoint_order: Vec::new(),
                waypoints: HashMap::new(),
                group_order: Vec::new(),
                groups: HashMap::new(),
            }),
        }
    }

    pub fn create_waypoint(
        &self,
        position: [f64; 3],
        waypoint_type: impl Into<String>,
        name: Option<String>,
        target: Option<[f64; 3]>,
        metadata: Option<Value>,
        group_ids: Option<Vec<String>>,
    ) -> Result<String, CoreError> {
        let mut inner = self.inner.lock();
        let group_ids = group_ids.unwrap_or_default();
        for group_id in &group_ids {
            if !inner.groups.contains_key(group_id) {
                return Err(CoreError::GroupNotFound { group_id: group_id.clone() });
            }
        }
        let id = uuid::Uuid::new_v4().to_string();
        inner.waypoints.insert(
            id.clone(),
            Waypoint { id: id.clone(), position, waypoint_type: waypoint_type.into(), name, target, metadata, group_ids },
        );
        inner.waypoint_order.push(id.clone());
        Ok(id)
    }

    pub fn list_waypoints(&self, waypoint_type: Option<&str>, group_id: Option<&str>) -> Vec<Waypoint> {
        let inner = self.inner.lock();
        inner
            .waypoint_order
            .iter()
            .filter_map(|id| inner.waypoints.get(id))
            .filter(|w| waypoint_type.is_none_or(|t| w.waypoint_type == t))
            .filter(|w| group_id.is_none_or(|g| w.group_ids.iter().any(|id| id == g)))
            .cloned()
            .collect()
    }

    pub fn update_waypoint(&self, id: &str, apply: impl FnOnce(&mut Waypoint)) -> bool {
        let mut inner = self.inner.lock();
        match inner.waypoints.get_mut(id) {
            Some(waypoint) => {
                apply(waypoint);
                true
            }
            None => false,
        }
    }

    pub fn remove_waypoint(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.waypoints.remove(id).is_some() {
            inner.waypoint_order.retain(|existing| existing != id);
            true
        } else {
            false
        }
    }

    pub fn remove_waypoints(&self, ids: &[String]) -> usize {
        ids.iter().filter(|id| self.remove_waypoint(id)).count()
    }

    pub fn clear_waypoints(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.waypoints.len();
        inner.waypoints.clear();
        inner.waypoint_order.clear();
        count
    }

    pub fn export(&self, include_groups: bool) -> ExportBundle {
        let inner = self.inner.lock();
        let waypoints = inner.waypoint_order.iter().filter_map(|id| inner.waypoints.get(id)).cloned().collect();
        let groups = include_groups
            .then(|| inner.group_order.iter().filter_map(|id| inner.groups.get(id)).cloned().collect());
        ExportBundle { waypoints, groups }
    }

    pub fn import(&self, bundle: ExportBundle, merge_mode: MergeMode) -> ImportStats {
        let mut inner = self.inner.lock();
        if merge_mode == MergeMode::Replace {
            inner.waypoints.clear();
            inner.waypoint_order.clear();
            inner.groups.clear();
            inner.group_order.clear();
        }

        let mut stats = ImportStats::default();

        for group in bundle.groups.into_iter().flatten() {
            let exists = inner.groups.contains_key(&group.id);
            if exists && merge_mode == MergeMode::SkipExisting {
                stats.groups_skipped += 1;
                continue;
            }
            if !exists {
                inner.group_order.push(group.id.clone());
            }
            inner.groups.insert(group.id.clone(), group);
            stats.groups_imported += 1;
        }

        for waypoint in bundle.waypoints {
            let exists = inner.waypoints.contains_key(&waypoint.id);
            if exists && merge_mode == MergeMode::SkipExisting {
                stats.waypoints_skipped += 1;
                continue;
            }
            if !exists {
                inner.waypoint_order.push(waypoint.id.clone());
            }
            inner.waypoints.insert(waypoint.id.clone(), waypoint);
            stats.waypoints_imported += 1;
        }

        stats
    }

    pub fn create_group(
        &self,
        name: impl Into<String>,
        parent_group_id: Option<String>,
        description: Option<String>,
    ) -> Result<String, CoreError> {
        let mut inner = self.inner.lock();
        if let Some(parent) = &parent_group_id {
            if !inner.groups.contains_key(parent) {
                return Err(CoreError::GroupNotFound { group_id: parent.clone() });
            }
        }
        let id = uuid::Uuid::new_v4().to_string();
        inner.groups.insert(id.clone(), Group { id: id.clone(), name: name.into(), parent_group_id, description });
        inner.group_order.push(id.clone());
        Ok(id)
    }

    pub fn list_groups(&self, parent: Option<&str>) -> Vec<Group> {
        let inner = self.inner.lock();
        inner
            .group_order
            .iter()
            .filter_map(|id| inner.groups.get(id))
            .filter(|g| match parent {
                Some(p) => g.parent_group_id.as_deref() == Some(p),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn get_group(&self, id: &str) -> Option<Group> {
        self.inner.lock().groups.get(id).cloned()
    }

    /// Removes a group. Without `cascade`, fails if the group has children.
    /// With `cascade`, recursively removes descendant groups first. In
    /// either case, waypoints that referenced the removed group(s) simply
    /// lose that membership rather than being deleted.
    pub fn remove_group(&self, id: &str, cascade: bool) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock();
        if !inner.groups.contains_key(id) {
            return Ok(false);
        }

        let children: Vec<String> =
            inner.group_order.iter().filter(|g| inner.groups[*g].parent_group_id.as_deref() == Some(id)).cloned().collect();

        if !children.is_empty() && !cascade {
            return Err(CoreError::invalid_parameter("group_id", "group has child groups; pass cascade=true"));
        }

        let mut to_remove = vec![id.to_string()];
        to_remove.extend(children);
        // cascade may need to go deeper than one level
        let mut frontier = to_remove.clone();
        while let Some(next) = frontier.pop() {
            let grandchildren: Vec<String> = inner
                .group_order
                .iter()
                .filter(|g| inner.groups[*g].parent_group_id.as_deref() == Some(next.as_str()))
                .cloned()
                .collect();
            for child in grandchildren {
                if !to_remove.contains(&child) {
                    to_remove.push(child.clone());
                    frontier.push(child);
                }
            }
        }

        for group_id in &to_remove {
            inner.groups.remove(group_id);
            inner.group_order.retain(|existing| existing != group_id);
        }
        for waypoint in inner.waypoints.values_mut() {
            waypoint.group_ids.retain(|g| !to_remove.contains(g));
        }

        Ok(true)
    }

    /// Renders the group parent/child relationships as a flat list of
    /// `(group_id, parent_group_id)` pairs; callers build a tree from it.
    pub fn group_hierarchy(&self) -> Vec<(String, Option<String>)> {
        let inner = self.inner.lock();
        inner.group_order.iter().filter_map(|id| inner.groups.get(id)).map(|g| (g.id.clone(), g.parent_group_id.clone())).collect()
    }

    pub fn add_waypoint_to_groups(&self, waypoint_id: &str, group_ids: &[String]) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock();
        for group_id in group_ids {
            if !inner.groups.contains_key(group_id) {
                return Err(CoreError::GroupNotFound { group_id: group_id.clone() });
            }
        }
        match inner.waypoints.get_mut(waypoint_id) {
            Some(waypoint) => {
                for group_id in group_ids {
                    if !waypoint.group_ids.contains(group_id) {
                        waypoint.group_ids.push(group_id.clone());
                    }
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_waypoint_from_groups(&self, waypoint_id: &str, group_ids: &[String]) -> bool {
        let mut inner = self.inner.lock();
        match inner.waypoints.get_mut(waypoint_id) {
            Some(waypoint) => {
                waypoint.group_ids.retain(|g| !group_ids.contains(g));
                true
            }
            None => false,
        }
    }

    pub fn get_waypoint_groups(&self, waypoint_id: &str) -> Option<Vec<String>> {
        self.inner.lock().waypoints.get(waypoint_id).map(|w| w.group_ids.clone())
    }

    /// `include_nested` also includes waypoints belonging to any descendant
    /// group.
    pub fn get_group_waypoints(&self, group_id: &str, include_nested: bool) -> Vec<String> {
        let inner = self.inner.lock();
        let mut targets = vec![group_id.to_string()];
        if include_nested {
            let mut frontier = vec![group_id.to_string()];
            while let Some(next) = frontier.pop() {
                for (id, group) in &inner.groups {
                    if group.parent_group_id.as_deref() == Some(next.as_str()) && !targets.contains(id) {
                        targets.push(id.clone());
                        frontier.push(id.clone());
                    }
                }
            }
        }
        inner
            .waypoint_order
            .iter()
            .filter_map(|id| inner.waypoints.get(id))
            .filter(|w| w.group_ids.iter().any(|g| targets.contains(g)))
            .map(|w| w.id.clone())
            .collect()
    }

    /// True if setting `group_id`'s parent to `candidate_parent` would
    /// create a cycle in the parent chain.
    pub fn would_form_cycle(&self, group_id: &str, candidate_parent: &str) -> bool {
        let inner = self.inner.lock();
        let mut current = Some(candidate_parent.to_string());
        while let Some(id) = current {
            if id == group_id {
                return true;
            }
            current = inner.groups.get(&id).and_then(|g| g.parent_group_id.clone());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_and_list_waypoints_round_trip() {
        let store = WaypointStore::new();
        let id = store.create_waypoint([1.0, 2.0, 3.0], "point_of_interest", Some("cube".into()), None, None, None).unwrap();
        let listed = store.list_waypoints(None, None);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[test]
    fn create_waypoint_rejects_unknown_group() {
        let store = WaypointStore::new();
        let err = store.create_waypoint([0.0; 3], "point_of_interest", None, None, None, Some(vec!["missing".into()])).unwrap_err();
        assert_eq!(err.error_code(), "GROUP_NOT_FOUND");
    }

    #[test]
    fn list_waypoints_filters_by_type_and_group() {
        let store = WaypointStore::new();
        let group = store.create_group("scene", None, None).unwrap();
        store.create_waypoint([0.0; 3], "camera_position", None, None, None, Some(vec![group.clone()])).unwrap();
        store.create_waypoint([0.0; 3], "object_anchor", None, None, None, None).unwrap();
        assert_eq!(store.list_waypoints(Some("camera_position"), None).len(), 1);
        assert_eq!(store.list_waypoints(None, Some(&group)).len(), 1);
    }

    #[test]
    fn remove_group_without_cascade_fails_when_children_exist() {
        let store = WaypointStore::new();
        let parent = store.create_group("root", None, None).unwrap();
        store.create_group("child", Some(parent.clone()), None).unwrap();
        let err = store.remove_group(&parent, false).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn remove_group_cascades_through_descendants() {
        let store = WaypointStore::new();
        let root = store.create_group("root", None, None).unwrap();
        let child = store.create_group("child", Some(root.clone()), None).unwrap();
        store.create_group("grandchild", Some(child.clone()), None).unwrap();
        assert!(store.remove_group(&root, true).unwrap());
        assert_eq!(store.list_groups(None).len(), 0);
    }

    #[test]
    fn waypoint_group_membership_survives_group_removal_as_a_strip_not_cascade() {
        let store = WaypointStore::new();
        let group = store.create_group("scene", None, None).unwrap();
        let waypoint = store.create_waypoint([0.0; 3], "spawn_point", None, None, None, Some(vec![group.clone()])).unwrap();
        store.remove_group(&group, false).unwrap();
        assert_eq!(store.get_waypoint_groups(&waypoint).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn would_form_cycle_detects_self_reference_through_ancestors() {
        let store = WaypointStore::new();
        let a = store.create_group("a", None, None).unwrap();
        let b = store.create_group("b", Some(a.clone()), None).unwrap();
        assert!(store.would_form_cycle(&a, &b));
        assert!(store.would_form_cycle(&a, &a));
    }

    #[test]
    fn get_group_waypoints_includes_nested_when_requested() {
        let store = WaypointStore::new();
        let root = store.create_group("root", None, None).unwrap();
        let child = store.create_group("child", Some(root.clone()), None).unwrap();
        let w1 = store.create_waypoint([0.0; 3], "point_of_interest", None, None, None, Some(vec![root.clone()])).unwrap();
        let w2 = store.create_waypoint([0.0; 3], "point_of_interest", None, None, None, Some(vec![child.clone()])).unwrap();
        assert_eq!(store.get_group_waypoints(&root, false), vec![w1.clone()]);
        let nested = store.get_group_waypoints(&root, true);
        assert!(nested.contains(&w1));
        assert!(nested.contains(&w2));
    }

    #[test]
    fn export_then_import_replace_round_trips() {
        let store = WaypointStore::new();
        store.create_waypoint([1.0, 2.0, 3.0], "object_anchor", None, None, None, None).unwrap();
        let bundle = store.export(true);

        let other = WaypointStore::new();
        let stats = other.import(bundle, MergeMode::Replace);
        assert_eq!(stats.waypoints_imported, 1);
        assert_eq!(other.list_waypoints(None, None).len(), 1);
    }

    #[test]
    fn import_skip_existing_does_not_overwrite() {
        let store = WaypointStore::new();
        let id = store.create_waypoint([0.0; 3], "object_anchor", Some("original".into()), None, None, None).unwrap();
        let mut bundle = store.export(false);
        bundle.waypoints[0].name = Some("renamed".into());
        let stats = store.import(bundle, MergeMode::SkipExisting);
        assert_eq!(stats.waypoints_skipped, 1);
        assert_eq!(store.list_waypoints(None, None)[0].name.as_deref(), Some("original"));
        let _ = id;
    }
}

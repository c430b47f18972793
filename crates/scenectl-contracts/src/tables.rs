//! Static per-service contract tables.
//!
//! These mirror the operation surface of the rendering-host services this
//! control plane fronts. Duplicate `http_route`/`http_method` pairs (e.g.
//! `worldrecorder`'s `health` alias) are intentional: the later entry in
//! declaration order wins the HTTP route lookup, matching the dict-overwrite
//! behavior of the tables they were distilled from. `operation` repeats
//! freely to form documented aliases; `mcp_tool` never repeats.

use scenectl_core::{HttpMethod, ToolContract};

use HttpMethod::{Get, Post};

pub fn worldbuilder() -> Vec<ToolContract> {
    vec![
        ToolContract::new("get_health", "health", Get, "worldbuilder_health_check"),
        ToolContract::new("get_metrics", "metrics", Get, "worldbuilder_get_metrics"),
        ToolContract::new("get_prometheus_metrics", "metrics.prom", Get, "worldbuilder_metrics_prometheus"),
        ToolContract::new("add_element", "add_element", Post, "worldbuilder_add_element"),
        ToolContract::new("create_batch", "create_batch", Post, "worldbuilder_create_batch"),
        ToolContract::new("place_asset", "place_asset", Post, "worldbuilder_place_asset"),
        ToolContract::new("transform_asset", "transform_asset", Post, "worldbuilder_transform_asset"),
        ToolContract::new("remove_element", "remove_element", Post, "worldbuilder_remove_element"),
        ToolContract::new("clear_path", "clear_path", Post, "worldbuilder_clear_path"),
        ToolContract::new("get_scene", "get_scene", Get, "worldbuilder_get_scene"),
        ToolContract::new("scene_status", "scene_status", Get, "worldbuilder_scene_status"),
        ToolContract::new("list_elements", "list_elements", Get, "worldbuilder_list_elements"),
        ToolContract::new("batch_info", "batch_info", Get, "worldbuilder_batch_info"),
        ToolContract::new("request_status", "request_status", Get, "worldbuilder_request_status"),
        ToolContract::new("query_objects_by_type", "query/objects_by_type", Get, "worldbuilder_query_objects_by_type"),
        ToolContract::new("query_objects_in_bounds", "query/objects_in_bounds", Get, "worldbuilder_query_objects_in_bounds"),
        ToolContract::new("query_objects_near_point", "query/objects_near_point", Get, "worldbuilder_query_objects_near_point"),
        ToolContract::new("calculate_bounds", "transform/calculate_bounds", Post, "worldbuilder_calculate_bounds"),
        ToolContract::new("find_ground_level", "transform/find_ground_level", Post, "worldbuilder_find_ground_level"),
        ToolContract::new("align_objects", "transform/align_objects", Post, "worldbuilder_align_objects"),
    ]
}

pub fn worldsurveyor() -> Vec<ToolContract> {
    vec![
        ToolContract::new("get_health", "health", Get, "worldsurveyor_health_check"),
        ToolContract::new("get_health", "health", Get, "worldsurveyor_health"),
        ToolContract::new("get_metrics", "metrics", Get, "worldsurveyor_get_metrics"),
        ToolContract::new("get_metrics", "metrics", Get, "worldsurveyor_metrics"),
        ToolContract::new("get_prometheus_metrics", "metrics.prom", Get, "worldsurveyor_metrics_prometheus"),
        ToolContract::new("waypoints_summary", "waypoints", Get, "worldsurveyor_waypoints_summary"),
        ToolContract::new("create_waypoint", "waypoints/create", Post, "worldsurveyor_create_waypoint"),
        ToolContract::new("list_waypoints", "waypoints/list", Get, "worldsurveyor_list_waypoints"),
        ToolContract::new("update_waypoint", "waypoints/update", Post, "worldsurveyor_update_waypoint"),
        ToolContract::new("remove_waypoint", "waypoints/remove", Post, "worldsurveyor_remove_waypoint"),
        ToolContract::new("remove_selected_waypoints", "waypoints/remove_selected", Post, "worldsurveyor_remove_selected_waypoints"),
        ToolContract::new("clear_waypoints", "waypoints/clear", Post, "worldsurveyor_clear_waypoints"),
        ToolContract::new("export_waypoints", "waypoints/export", Get, "worldsurveyor_export_waypoints"),
        ToolContract::new("import_waypoints", "waypoints/import", Post, "worldsurveyor_import_waypoints"),
        ToolContract::new("goto_waypoint", "waypoints/goto", Post, "worldsurveyor_goto_waypoint"),
        ToolContract::new("create_group", "groups/create", Post, "worldsurveyor_create_group"),
        ToolContract::new("list_groups", "groups/list", Get, "worldsurveyor_list_groups"),
        ToolContract::new("get_group", "groups/get", Get, "worldsurveyor_get_group"),
        ToolContract::new("remove_group", "groups/remove", Post, "worldsurveyor_remove_group"),
        ToolContract::new("group_hierarchy", "groups/hierarchy", Get, "worldsurveyor_group_hierarchy"),
        ToolContract::new("add_waypoint_to_groups", "groups/add_waypoint", Post, "worldsurveyor_add_waypoint_to_groups"),
        ToolContract::new("remove_waypoint_from_groups", "groups/remove_waypoint", Post, "worldsurveyor_remove_waypoint_from_groups"),
        ToolContract::new("get_waypoint_groups", "groups/of_waypoint", Get, "worldsurveyor_get_waypoint_groups"),
        ToolContract::new("get_group_waypoints", "groups/waypoints", Get, "worldsurveyor_get_group_waypoints"),
        ToolContract::new("set_markers_visible", "markers/visible", Post, "worldsurveyor_set_markers_visible"),
        ToolContract::new("set_individual_marker_visible", "markers/individual", Post, "worldsurveyor_set_individual_marker_visible"),
        ToolContract::new("set_selective_markers_visible", "markers/selective", Post, "worldsurveyor_set_selective_markers_visible"),
        ToolContract::new("debug_status", "markers/debug", Get, "worldsurveyor_debug_status"),
    ]
}

pub fn worldrecorder() -> Vec<ToolContract> {
    vec![
        ToolContract::new("get_health", "health", Get, "worldrecorder_health_check"),
        ToolContract::new("get_metrics", "metrics", Get, "worldrecorder_get_metrics"),
        ToolContract::new("get_prometheus_metrics", "metrics.prom", Get, "worldrecorder_metrics_prometheus"),
        ToolContract::new("get_status", "video/status", Get, "worldrecorder_get_status"),
        ToolContract::new("start_video", "video/start", Post, "worldrecorder_start_video"),
        ToolContract::new("cancel_video", "video/cancel", Post, "worldrecorder_cancel_video"),
        ToolContract::new("capture_frame", "viewport/capture_frame", Post, "worldrecorder_capture_frame"),
        ToolContract::new("cleanup_frames", "cleanup/frames", Post, "worldrecorder_cleanup_frames"),
        ToolContract::new("get_status", "recording/status", Get, "worldrecorder_recording_status"),
        ToolContract::new("start_video", "recording/start", Post, "worldrecorder_start_recording"),
        ToolContract::new("cancel_video", "recording/cancel", Post, "worldrecorder_cancel_recording"),
        ToolContract::new("get_health", "health", Get, "worldrecorder_health"),
    ]
}

pub fn worldviewer() -> Vec<ToolContract> {
    vec![
        ToolContract::new("get_health", "health", Get, "worldviewer_health_check"),
        ToolContract::new("get_metrics", "metrics", Get, "worldviewer_get_metrics"),
        ToolContract::new("get_prometheus_metrics", "metrics.prom", Get, "worldviewer_metrics_prometheus"),
        ToolContract::new("camera_status", "camera/status", Get, "worldviewer_camera_status"),
        ToolContract::new("camera_set_position", "camera/set_position", Post, "worldviewer_camera_set_position"),
        ToolContract::new("camera_frame_object", "camera/frame_object", Post, "worldviewer_camera_frame_object"),
        ToolContract::new("camera_orbit", "camera/orbit", Post, "worldviewer_camera_orbit"),
        ToolContract::new("camera_smooth_move", "camera/smooth_move", Post, "worldviewer_camera_smooth_move"),
        ToolContract::new("camera_stop_movement", "camera/stop_movement", Post, "worldviewer_camera_stop_movement"),
        ToolContract::new("camera_movement_status", "camera/movement_status", Get, "worldviewer_camera_movement_status"),
        ToolContract::new("get_asset_transform", "get_asset_transform", Get, "worldviewer_get_asset_transform"),
    ]
}

pub fn worldstreamer() -> Vec<ToolContract> {
    vec![
        ToolContract::new("get_health", "health", Get, "worldstreamer_health_check"),
        ToolContract::new("start_streaming", "streaming/start", Post, "worldstreamer_start_streaming"),
        ToolContract::new("stop_streaming", "streaming/stop", Post, "worldstreamer_stop_streaming"),
        ToolContract::new("get_status", "streaming/status", Get, "worldstreamer_get_status"),
        ToolContract::new("get_streaming_urls", "streaming/urls", Get, "worldstreamer_get_streaming_urls"),
        ToolContract::new("validate_environment", "streaming/environment/validate", Get, "worldstreamer_validate_environment"),
    ]
}

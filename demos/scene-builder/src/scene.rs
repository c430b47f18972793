//! The in-memory scene graph this demo fronts: elements, batches, and the
//! spatial queries `worldbuilder`'s contract table exposes over them.
//!
//! Every method here is a pure function of the store's current state; it is
//! the caller's job (see `main.rs`) to decide whether an operation is
//! read-only (answered inline) or mutating (queued and drained on a tick).

use std::collections::HashMap;

use parking_lot::Mutex;
use scenectl_core::CoreError;
use scenectl_queue::Channel;
use scenectl_queue::OperationHandler;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub scene_path: String,
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Batch {
    id: String,
    element_ids: Vec<String>,
}

struct Inner {
    elements: HashMap<String, Element>,
    batches: HashMap<String, Batch>,
}

/// The render-host scene state. Reads may happen from any HTTP worker
/// thread; writes are only ever applied from [`apply`] on the tick thread.
pub struct SceneStore {
    inner: Mutex<Inner>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { elements: HashMap::new(), batches: HashMap::new() }) }
    }

    // ---- read-only queries, safe to answer inline ----

    pub fn get_scene(&self) -> Value {
        let inner = self.inner.lock();
        let elements: Vec<&Element> = inner.elements.values().collect();
        serde_json::json!({ "element_count": elements.len(), "elements": elements })
    }

    pub fn scene_status(&self) -> Value {
        let inner = self.inner.lock();
        serde_json::json!({
            "element_count": inner.elements.len(),
            "batch_count": inner.batches.len(),
        })
    }

    pub fn list_elements(&self, payload: &Value) -> Result<Value, CoreError> {
        let offset = payload.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = payload.get("limit").and_then(Value::as_u64).unwrap_or(100) as usize;
        let inner = self.inner.lock();
        let mut ids: Vec<&String> = inner.elements.keys().collect();
        ids.sort();
        let page: Vec<&Element> = ids.into_iter().skip(offset).take(limit).filter_map(|id| inner.elements.get(id)).collect();
        Ok(serde_json::json!({ "elements": page, "total": inner.elements.len() }))
    }

    pub fn batch_info(&self, payload: &Value) -> Result<Value, CoreError> {
        let batch_id = require_str(payload, "batch_id")?;
        let inner = self.inner.lock();
        let batch = inner.batches.get(batch_id).ok_or_else(|| CoreError::NotFound { what: format!("batch `{batch_id}`") })?;
        let elements: Vec<&Element> = batch.element_ids.iter().filter_map(|id| inner.elements.get(id)).collect();
        Ok(serde_json::json!({ "batch_id": batch.id, "elements": elements }))
    }

    pub fn query_objects_by_type(&self, payload: &Value) -> Result<Value, CoreError> {
        let kind = require_str(payload, "type")?;
        let inner = self.inner.lock();
        let matches: Vec<&Element> = inner.elements.values().filter(|e| e.kind == kind).collect();
        Ok(serde_json::json!({ "elements": matches }))
    }

    pub fn query_objects_in_bounds(&self, payload: &Value) -> Result<Value, CoreError> {
        let min = require_vec3(payload, "min")?;
        let max = require_vec3(payload, "max")?;
        let inner = self.inner.lock();
        let matches: Vec<&Element> = inner
            .elements
            .values()
            .filter(|e| (0..3).all(|axis| e.position[axis] >= min[axis] && e.position[axis] <= max[axis]))
            .collect();
        Ok(serde_json::json!({ "elements": matches }))
    }

    pub fn query_objects_near_point(&self, payload: &Value) -> Result<Value, CoreError> {
        let point = require_vec3(payload, "point")?;
        let radius = payload.get("radius").and_then(Value::as_f64).ok_or_else(|| CoreError::missing_parameter("radius"))?;
        let inner = self.inner.lock();
        let matches: Vec<&Element> = inner.elements.values().filter(|e| distance(&e.position, &point) <= radius).collect();
        Ok(serde_json::json!({ "elements": matches }))
    }

    pub fn calculate_bounds(&self, payload: &Value) -> Result<Value, CoreError> {
        let inner = self.inner.lock();
        let selected: Vec<&Element> = match payload.get("ids").and_then(Value::as_array) {
            Some(ids) => {
                let ids: Vec<&str> = ids.iter().filter_map(Value::as_str).collect();
                inner.elements.values().filter(|e| ids.contains(&e.id.as_str())).collect()
            }
            None => inner.elements.values().collect(),
        };
        if selected.is_empty() {
            return Err(CoreError::NotFound { what: "no matching elements to bound".to_string() });
        }
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for element in &selected {
            for axis in 0..3 {
                let half = element.scale[axis] / 2.0;
                min[axis] = min[axis].min(element.position[axis] - half);
                max[axis] = max[axis].max(element.position[axis] + half);
            }
        }
        Ok(serde_json::json!({ "min": min, "max": max }))
    }

    /// Reports the y-coordinate of the highest element surface directly
    /// beneath `position`'s x/z, or `0.0` (the implicit ground plane) when
    /// nothing is underneath.
    pub fn find_ground_level(&self, payload: &Value) -> Result<Value, CoreError> {
        let position = require_vec3(payload, "position")?;
        let inner = self.inner.lock();
        let mut ground = 0.0_f64;
        for element in inner.elements.values() {
            let half_x = element.scale[0] / 2.0;
            let half_z = element.scale[2] / 2.0;
            let within_x = (element.position[0] - half_x..=element.position[0] + half_x).contains(&position[0]);
            let within_z = (element.position[2] - half_z..=element.position[2] + half_z).contains(&position[2]);
            if within_x && within_z {
                let top = element.position[1] + element.scale[1] / 2.0;
                if top <= position[1] {
                    ground = ground.max(top);
                }
            }
        }
        Ok(serde_json::json!({ "ground_level": ground }))
    }

    // `request_status` has no SceneStore counterpart: it is answered
    // directly against the RequestTracker in `main.rs`.

    // ---- mutations, only ever invoked from the tick thread ----

    fn add_element(&self, payload: &Value) -> Result<Value, CoreError> {
        let element = element_from_payload(payload, None)?;
        let value = serde_json::to_value(&element).expect("Element always serializes");
        self.inner.lock().elements.insert(element.id.clone(), element);
        Ok(value)
    }

    fn create_batch(&self, payload: &Value) -> Result<Value, CoreError> {
        let specs = payload.get("elements").and_then(Value::as_array).ok_or_else(|| CoreError::missing_parameter("elements"))?;
        if specs.is_empty() {
            return Err(CoreError::invalid_parameter("elements", "must contain at least one element"));
        }
        let batch_id = uuid::Uuid::new_v4().to_string();
        let mut created = Vec::with_capacity(specs.len());
        let mut guard = self.inner.lock();
        for spec in specs {
            let element = element_from_payload(spec, Some(batch_id.clone()))?;
            created.push(element.id.clone());
            guard.elements.insert(element.id.clone(), element);
        }
        guard.batches.insert(batch_id.clone(), Batch { id: batch_id.clone(), element_ids: created.clone() });
        Ok(serde_json::json!({ "batch_id": batch_id, "element_ids": created }))
    }

    fn place_asset(&self, payload: &Value) -> Result<Value, CoreError> {
        let mut element = element_from_payload(payload, None)?;
        element.kind = "asset".to_string();
        element.asset_path = Some(require_str(payload, "asset_path")?.to_string());
        let value = serde_json::to_value(&element).expect("Element always serializes");
        self.inner.lock().elements.insert(element.id.clone(), element);
        Ok(value)
    }

    fn transform_asset(&self, payload: &Value) -> Result<Value, CoreError> {
        let id = require_str(payload, "id")?;
        let mut guard = self.inner.lock();
        let element = guard.elements.get_mut(id).ok_or_else(|| CoreError::NotFound { what: format!("element `{id}`") })?;
        if let Some(v) = payload.get("position") {
            element.position = parse_vec3(v)?;
        }
        if let Some(v) = payload.get("rotation") {
            element.rotation = parse_vec3(v)?;
        }
        if let Some(v) = payload.get("scale") {
            element.scale = parse_vec3(v)?;
        }
        Ok(serde_json::to_value(&*element).expect("Element always serializes"))
    }

    fn remove_element(&self, payload: &Value) -> Result<Value, CoreError> {
        let id = require_str(payload, "id")?;
        let removed = self.inner.lock().elements.remove(id);
        if removed.is_none() {
            return Err(CoreError::NotFound { what: format!("element `{id}`") });
        }
        Ok(serde_json::json!({ "removed": id }))
    }

    fn clear_path(&self, payload: &Value) -> Result<Value, CoreError> {
        let prefix = require_str(payload, "path_prefix")?;
        let mut guard = self.inner.lock();
        let doomed: Vec<String> =
            guard.elements.values().filter(|e| e.scene_path.starts_with(prefix)).map(|e| e.id.clone()).collect();
        for id in &doomed {
            guard.elements.remove(id);
        }
        Ok(serde_json::json!({ "removed_count": doomed.len(), "removed_ids": doomed }))
    }

    fn align_objects(&self, payload: &Value) -> Result<Value, CoreError> {
        let ids = payload.get("ids").and_then(Value::as_array).ok_or_else(|| CoreError::missing_parameter("ids"))?;
        let ids: Vec<&str> = ids.iter().filter_map(Value::as_str).collect();
        if ids.len() < 2 {
            return Err(CoreError::invalid_parameter("ids", "must name at least two elements"));
        }
        let axis = match require_str(payload, "axis")? {
            "x" => 0,
            "y" => 1,
            "z" => 2,
            other => return Err(CoreError::invalid_parameter("axis", format!("must be x, y, or z, got `{other}`"))),
        };
        let mut guard = self.inner.lock();
        let reference = guard
            .elements
            .get(ids[0])
            .ok_or_else(|| CoreError::NotFound { what: format!("element `{}`", ids[0]) })?
            .position[axis];
        let mut aligned = Vec::new();
        for id in &ids[1..] {
            let Some(element) = guard.elements.get_mut(*id) else {
                return Err(CoreError::NotFound { what: format!("element `{id}`") });
            };
            element.position[axis] = reference;
            aligned.push((*id).to_string());
        }
        Ok(serde_json::json!({ "aligned": aligned, "value": reference }))
    }

    /// Dispatches a mutating operation. Returns `Err` as a human-readable
    /// reason string, matching [`OperationHandler`]'s contract.
    pub fn apply(&self, operation: &str, payload: &Value) -> Result<Value, String> {
        let result = match operation {
            "add_element" => self.add_element(payload),
            "create_batch" => self.create_batch(payload),
            "place_asset" => self.place_asset(payload),
            "transform_asset" => self.transform_asset(payload),
            "remove_element" => self.remove_element(payload),
            "clear_path" => self.clear_path(payload),
            "align_objects" => self.align_objects(payload),
            other => Err(CoreError::domain_failed(other, "no handler registered for this mutation")),
        };
        result.map_err(|e| e.to_string())
    }
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts [`SceneStore::apply`] to the `TickExecutor`'s [`OperationHandler`].
pub struct SceneOperationHandler<'a>(pub &'a SceneStore);

impl OperationHandler for SceneOperationHandler<'_> {
    fn invoke(&self, _channel: Channel, operation: &str, payload: &Value) -> Result<Value, String> {
        self.0.apply(operation, payload)
    }
}

fn element_from_payload(payload: &Value, batch_id: Option<String>) -> Result<Element, CoreError> {
    let name = require_str(payload, "name")?.to_string();
    let position = require_vec3(payload, "position")?;
    let rotation = payload.get("rotation").map(parse_vec3).transpose()?.unwrap_or([0.0, 0.0, 0.0]);
    let scale = payload.get("scale").map(parse_vec3).transpose()?.unwrap_or([1.0, 1.0, 1.0]);
    for (axis, value) in scale.iter().enumerate() {
        if *value < 0.1 {
            return Err(CoreError::invalid_parameter("scale", format!("component {axis} must be >= 0.1, got {value}")));
        }
    }
    let color = payload.get("color").map(parse_color).transpose()?;
    let kind = payload.get("kind").and_then(Value::as_str).unwrap_or("generic").to_string();
    let scene_path = payload.get("scene_path").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| format!("/{name}"));
    if !scene_path.starts_with('/') {
        return Err(CoreError::invalid_parameter("scene_path", "must begin with `/`"));
    }
    Ok(Element {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        kind,
        scene_path,
        position,
        rotation,
        scale,
        color,
        asset_path: None,
        batch_id,
    })
}

fn require_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, CoreError> {
    payload.get(field).and_then(Value::as_str).ok_or_else(|| CoreError::missing_parameter(field))
}

fn require_vec3(payload: &Value, field: &str) -> Result<[f64; 3], CoreError> {
    let value = payload.get(field).ok_or_else(|| CoreError::missing_parameter(field))?;
    parse_vec3(value)
}

fn parse_vec3(value: &Value) -> Result<[f64; 3], CoreError> {
    let arr = value.as_array().ok_or_else(|| CoreError::invalid_parameter("position", "must be a 3-element array"))?;
    if arr.len() != 3 {
        return Err(CoreError::invalid_parameter("position", format!("must have exactly 3 components, got {}", arr.len())));
    }
    let mut out = [0.0_f64; 3];
    for (i, v) in arr.iter().enumerate() {
        out[i] = v.as_f64().ok_or_else(|| CoreError::invalid_parameter("position", "components must be numeric"))?;
    }
    Ok(out)
}

fn parse_color(value: &Value) -> Result<[f64; 3], CoreError> {
    match value {
        Value::String(s) if s.starts_with('#') && s.len() == 7 => {
            let channel = |range: std::ops::Range<usize>| -> Result<f64, CoreError> {
                u8::from_str_radix(&s[range], 16)
                    .map(|b| b as f64 / 255.0)
                    .map_err(|_| CoreError::invalid_parameter("color", "must be `#RRGGBB`"))
            };
            Ok([channel(1..3)?, channel(3..5)?, channel(5..7)?])
        }
        Value::Array(_) => parse_vec3(value),
        _ => Err(CoreError::invalid_parameter("color", "must be a `#RRGGBB` hex string or a 3-float array")),
    }
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

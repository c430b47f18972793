//! Typed input validation producing a validated value or a `ValidationError`
//! carrying the offending field name and a human reason.
//!
//! Every check here is a pure function of its inputs — no I/O, no shared
//! state — so controllers can compose them freely and the batch API
//! (`validate_batch`) can run every check even after an earlier one fails.

pub mod dangerous;
pub mod patterns;

use std::net::IpAddr;

use scenectl_core::CoreError;
use serde_json::Value;

pub use dangerous::DangerousClass;
pub use patterns::PatternSet;

/// A validation failure: which field, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { field: field.into(), reason: reason.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for CoreError {
    fn from(e: ValidationError) -> Self {
        CoreError::validation(e.field, e.reason)
    }
}

pub type VResult<T> = Result<T, ValidationError>;

/// Bounded numeric validation for a signed 64-bit integer.
pub fn validate_int(field: &str, value: i64, min: Option<i64>, max: Option<i64>) -> VResult<i64> {
    if let Some(min) = min {
        if value < min {
            return Err(ValidationError::new(field, format!("must be >= {min}, got {value}")));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(ValidationError::new(field, format!("must be <= {max}, got {value}")));
        }
    }
    Ok(value)
}

/// Bounded numeric validation for a 64-bit float.
pub fn validate_float(field: &str, value: f64, min: Option<f64>, max: Option<f64>) -> VResult<f64> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if let Some(min) = min {
        if value < min {
            return Err(ValidationError::new(field, format!("must be >= {min}, got {value}")));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(ValidationError::new(field, format!("must be <= {max}, got {value}")));
        }
    }
    Ok(value)
}

/// Dimension (width/height) in `[1, 7680]`.
pub fn validate_dimension(field: &str, value: i64) -> VResult<i64> {
    validate_int(field, value, Some(1), Some(7680))
}

/// Frame rate in `[1, 120]`.
pub fn validate_fps(field: &str, value: i64) -> VResult<i64> {
    validate_int(field, value, Some(1), Some(120))
}

/// Encoder bitrate, kbps, in `[100, 100000]`.
pub fn validate_bitrate(field: &str, value: i64) -> VResult<i64> {
    validate_int(field, value, Some(100), Some(100000))
}

/// Bounded string validation: optional length range, optional named pattern,
/// optional dangerous-character class.
pub fn validate_string(
    field: &str,
    value: &str,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<PatternSet>,
    dangerous: Option<DangerousClass>,
) -> VResult<String> {
    if let Some(min_len) = min_len {
        if value.len() < min_len {
            return Err(ValidationError::new(field, format!("must be at least {min_len} chars")));
        }
    }
    if let Some(max_len) = max_len {
        if value.len() > max_len {
            return Err(ValidationError::new(field, format!("must be at most {max_len} chars")));
        }
    }
    if let Some(class) = dangerous {
        if let Some(token) = class.find_violation(value) {
            return Err(ValidationError::new(field, format!("contains disallowed sequence `{token}`")));
        }
    }
    if let Some(pattern) = pattern {
        if !pattern.regex().is_match(value) {
            return Err(ValidationError::new(field, format!("does not match required pattern {pattern:?}")));
        }
    }
    Ok(value.to_string())
}

/// Boolean validation: `true/false`, `1/0`, `yes/no`, `on/off`
/// case-insensitively, or any nonzero JSON number.
pub fn validate_boolean(field: &str, value: &Value) -> VResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ValidationError::new(field, format!("not a recognized boolean: `{other}`"))),
        },
        _ => Err(ValidationError::new(field, "not a recognized boolean")),
    }
}

/// URL validation: scheme allow-list plus optional localhost/private-range
/// gates, and a `Shell` dangerous-character rejection on the raw string.
pub fn validate_url(
    field: &str,
    value: &str,
    allowed_schemes: &[&str],
    allow_localhost: bool,
    allow_private_ips: bool,
) -> VResult<String> {
    if let Some(token) = DangerousClass::Shell.find_violation(value) {
        return Err(ValidationError::new(field, format!("contains disallowed sequence `{token}`")));
    }
    let parsed = url::Url::parse(value).map_err(|e| ValidationError::new(field, format!("not a valid URL: {e}")))?;
    if !allowed_schemes.contains(&parsed.scheme()) {
        return Err(ValidationError::new(field, format!("scheme `{}` is not allowed", parsed.scheme())));
    }
    if let Some(host) = parsed.host_str() {
        if !allow_localhost && (host == "localhost" || host == "127.0.0.1" || host == "::1") {
            return Err(ValidationError::new(field, "localhost URLs are not allowed"));
        }
        if !allow_private_ips {
            if let Ok(ip) = host.parse::<IpAddr>() {
                if is_private(&ip) {
                    return Err(ValidationError::new(field, "private-range IPs are not allowed"));
                }
            }
        }
    }
    Ok(value.to_string())
}

fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Color validation: a `#RRGGBB` hex string, or an explicit 3-float tuple
/// each in `[0, 1]`. Returns `[r, g, b]` normalized to `[0, 1]`.
pub fn validate_color(field: &str, value: &Value) -> VResult<[f64; 3]> {
    match value {
        Value::String(s) => {
            if !PatternSet::HexColor.regex().is_match(s) {
                return Err(ValidationError::new(field, "must be `#RRGGBB`"));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&s[range], 16).expect("regex guarantees valid hex digits")
            };
            Ok([channel(1..3) as f64 / 255.0, channel(3..5) as f64 / 255.0, channel(5..7) as f64 / 255.0])
        }
        Value::Array(arr) => {
            let triple = exactly_n_f64(field, arr, 3)?;
            for c in &triple {
                if !(0.0..=1.0).contains(c) {
                    return Err(ValidationError::new(field, "color components must be in [0, 1]"));
                }
            }
            Ok([triple[0], triple[1], triple[2]])
        }
        _ => Err(ValidationError::new(field, "must be a hex string or a 3-float array")),
    }
}

/// Position / rotation: exactly 3 numeric components.
pub fn validate_position(field: &str, value: &[Value]) -> VResult<[f64; 3]> {
    let v = exactly_n_f64(field, value, 3)?;
    Ok([v[0], v[1], v[2]])
}

/// Scale: exactly 3 numeric components, each `>= 0.1`.
pub fn validate_scale(field: &str, value: &[Value]) -> VResult<[f64; 3]> {
    let v = exactly_n_f64(field, value, 3)?;
    for c in &v {
        if *c < 0.1 {
            return Err(ValidationError::new(field, format!("scale components must be >= 0.1, got {c}")));
        }
    }
    Ok([v[0], v[1], v[2]])
}

fn exactly_n_f64(field: &str, value: &[Value], n: usize) -> VResult<Vec<f64>> {
    if value.len() != n {
        return Err(ValidationError::new(field, format!("must have exactly {n} components, got {}", value.len())));
    }
    value
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| ValidationError::new(field, "components must be numeric")))
        .collect()
}

/// Scene path: must begin with `/` and match `^/[A-Za-z0-9_/]+$`.
pub fn validate_scene_path(field: &str, value: &str) -> VResult<String> {
    validate_string(field, value, None, None, Some(PatternSet::ScenePath), None)
}

/// Filesystem path: no `..`, optional extension allow-list, optional
/// existence check.
pub fn validate_file_path(
    field: &str,
    value: &str,
    allowed_extensions: Option<&[&str]>,
    check_exists: bool,
) -> VResult<String> {
    if value.contains("..") {
        return Err(ValidationError::new(field, "path traversal sequences are not allowed"));
    }
    if let Some(allowed) = allowed_extensions {
        let ext = std::path::Path::new(value).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if !allowed.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext)) {
            return Err(ValidationError::new(field, format!("extension `.{ext}` is not allowed")));
        }
    }
    if check_exists && !std::path::Path::new(value).exists() {
        return Err(ValidationError::new(field, "file does not exist"));
    }
    Ok(value.to_string())
}

/// JSON validation: accepts an already-parsed object/array, or parses a
/// JSON-encoded string.
pub fn validate_json(field: &str, value: &Value) -> VResult<Value> {
    match value {
        Value::String(s) => serde_json::from_str(s).map_err(|e| ValidationError::new(field, format!("invalid JSON: {e}"))),
        other => Ok(other.clone()),
    }
}

/// Enum validation: value must be one of `allowed`.
pub fn validate_enum<'a>(field: &str, value: &str, allowed: &[&'a str]) -> VResult<&'a str> {
    allowed
        .iter()
        .find(|a| **a == value)
        .copied()
        .ok_or_else(|| ValidationError::new(field, format!("must be one of {allowed:?}, got `{value}`")))
}

/// Runs every check and aggregates all failures rather than short-circuiting
/// on the first — the compile-time-checked replacement for the original
/// `(field, value, method_name, kwargs)` dynamic-dispatch batch API: callers
/// build a list of closures instead of naming a validator method by string.
pub fn validate_batch(
    checks: Vec<(&str, Box<dyn FnOnce() -> VResult<Value>>)>,
) -> Result<Vec<(String, Value)>, Vec<ValidationError>> {
    let mut ok = Vec::new();
    let mut errors = Vec::new();
    for (field, check) in checks {
        match check() {
            Ok(value) => ok.push((field.to_string(), value)),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() { Ok(ok) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_round_trips_to_normalized_floats() {
        assert_eq!(validate_color("tint", &serde_json::json!("#FF0000")).unwrap(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn color_tuple_is_passed_through() {
        let v = serde_json::json!([1.0, 0.5, 0.0]);
        assert_eq!(validate_color("tint", &v).unwrap(), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn color_missing_hash_is_rejected() {
        assert!(validate_color("tint", &serde_json::json!("FF0000")).is_err());
    }

    #[test]
    fn dimension_boundaries() {
        assert!(validate_dimension("width", 0).is_err());
        assert!(validate_dimension("width", 1).is_ok());
        assert!(validate_dimension("width", 7680).is_ok());
        assert!(validate_dimension("width", 7681).is_err());
    }

    #[test]
    fn fps_boundaries() {
        assert!(validate_fps("fps", 0).is_err());
        assert!(validate_fps("fps", 1).is_ok());
        assert!(validate_fps("fps", 120).is_ok());
        assert!(validate_fps("fps", 121).is_err());
    }

    #[test]
    fn bitrate_boundaries() {
        assert!(validate_bitrate("bitrate", 99).is_err());
        assert!(validate_bitrate("bitrate", 100).is_ok());
        assert!(validate_bitrate("bitrate", 100000).is_ok());
        assert!(validate_bitrate("bitrate", 100001).is_err());
    }

    #[test]
    fn position_requires_exactly_three_components() {
        let two = vec![serde_json::json!(0), serde_json::json!(0)];
        let three = vec![serde_json::json!(0), serde_json::json!(0), serde_json::json!(1)];
        let four = vec![serde_json::json!(0); 4];
        assert!(validate_position("position", &two).is_err());
        assert!(validate_position("position", &three).is_ok());
        assert!(validate_position("position", &four).is_err());
    }

    #[test]
    fn scale_rejects_components_below_point_one() {
        let low = vec![serde_json::json!(0.09), serde_json::json!(1.0), serde_json::json!(1.0)];
        let ok = vec![serde_json::json!(0.1), serde_json::json!(1.0), serde_json::json!(1.0)];
        assert!(validate_scale("scale", &low).is_err());
        assert!(validate_scale("scale", &ok).is_ok());
    }

    #[test]
    fn boolean_accepts_documented_spellings() {
        for (v, expect) in [("true", true), ("YES", true), ("on", true), ("0", false), ("off", false)] {
            assert_eq!(validate_boolean("flag", &serde_json::json!(v)).unwrap(), expect);
        }
    }

    #[test]
    fn batch_aggregates_every_failure() {
        let checks: Vec<(&str, Box<dyn FnOnce() -> VResult<Value>>)> = vec![
            ("width", Box::new(|| validate_dimension("width", 0).map(Value::from))),
            ("fps", Box::new(|| validate_fps("fps", 1).map(Value::from))),
            ("bitrate", Box::new(|| validate_bitrate("bitrate", 1).map(Value::from))),
        ];
        let Err(errors) = validate_batch(checks) else { panic!("expected aggregated failure") };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn file_path_rejects_traversal() {
        assert!(validate_file_path("asset", "../../etc/passwd", None, false).is_err());
        assert!(validate_file_path("asset", "demo/cube.usdz", None, false).is_ok());
    }

    #[test]
    fn url_rejects_disallowed_scheme() {
        assert!(validate_url("sink", "file:///etc/passwd", &["srt", "rtmp"], false, false).is_err());
        assert!(validate_url("sink", "srt://example.com:9000", &["srt", "rtmp"], false, false).is_ok());
    }

    #[test]
    fn url_localhost_gate() {
        assert!(validate_url("sink", "http://localhost:8080", &["http"], false, false).is_err());
        assert!(validate_url("sink", "http://localhost:8080", &["http"], true, false).is_ok());
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn dimension_in_range_is_always_ok(v in 1i64..=7680) {
            prop_assert!(validate_dimension("width", v).is_ok());
        }

        #[test]
        fn dimension_out_of_range_is_always_err(v in prop_oneof![i64::MIN..=0, 7681i64..=i64::MAX]) {
            prop_assert!(validate_dimension("width", v).is_err());
        }

        #[test]
        fn fps_in_range_is_always_ok(v in 1i64..=120) {
            prop_assert!(validate_fps("fps", v).is_ok());
        }

        #[test]
        fn fps_out_of_range_is_always_err(v in prop_oneof![i64::MIN..=0, 121i64..=i64::MAX]) {
            prop_assert!(validate_fps("fps", v).is_err());
        }

        #[test]
        fn bitrate_in_range_is_always_ok(v in 100i64..=100000) {
            prop_assert!(validate_bitrate("bitrate", v).is_ok());
        }

        #[test]
        fn bitrate_out_of_range_is_always_err(v in prop_oneof![i64::MIN..=99, 100001i64..=i64::MAX]) {
            prop_assert!(validate_bitrate("bitrate", v).is_err());
        }

        #[test]
        fn scale_below_point_one_is_always_err(x in -10.0f64..0.0999999) {
            let scale = vec![serde_json::json!(x), serde_json::json!(1.0), serde_json::json!(1.0)];
            prop_assert!(validate_scale("scale", &scale).is_err());
        }

        #[test]
        fn scale_at_or_above_point_one_is_always_ok(x in 0.1f64..10.0) {
            let scale = vec![serde_json::json!(x), serde_json::json!(1.0), serde_json::json!(1.0)];
            prop_assert!(validate_scale("scale", &scale).is_ok());
        }
    }
}

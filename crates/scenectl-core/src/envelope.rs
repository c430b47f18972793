//! The uniform JSON response shape every controller must emit.
//!
//! A response is always exactly one of [`Envelope::Success`] or
//! [`Envelope::Error`]; controllers never emit a bare payload.

use serde_json::{Map, Value};

use crate::error::CoreError;

/// A response envelope: success with domain fields, or a symbolic error.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Error(ErrorEnvelope),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SuccessEnvelope {
    pub success: SuccessMarker,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A unit type that always serializes `success` as the literal `true`.
#[derive(Debug, Clone, Copy)]
pub struct SuccessMarker;

impl serde::Serialize for SuccessMarker {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bool(true)
    }
}

impl<'de> serde::Deserialize<'de> for SuccessMarker {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = bool::deserialize(d)?;
        if v { Ok(SuccessMarker) } else { Err(serde::de::Error::custom("expected success=true")) }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    pub success: FailureMarker,
    pub error_code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct FailureMarker;

impl serde::Serialize for FailureMarker {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bool(false)
    }
}

impl<'de> serde::Deserialize<'de> for FailureMarker {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = bool::deserialize(d)?;
        if !v { Ok(FailureMarker) } else { Err(serde::de::Error::custom("expected success=false")) }
    }
}

impl Envelope {
    pub fn success(fields: Map<String, Value>) -> Self {
        Envelope::Success(SuccessEnvelope { success: SuccessMarker, fields })
    }

    pub fn empty_success() -> Self {
        Self::success(Map::new())
    }

    pub fn error(error_code: impl Into<String>, message: impl Into<String>, details: Option<Value>) -> Self {
        Envelope::Error(ErrorEnvelope {
            success: FailureMarker,
            error_code: error_code.into(),
            error: message.into(),
            details,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Envelope::Success(_) => 200,
            Envelope::Error(e) => status_for_code(&e.error_code),
        }
    }
}

impl From<CoreError> for Envelope {
    fn from(err: CoreError) -> Self {
        Envelope::error(err.error_code(), err.to_string(), err.details())
    }
}

fn status_for_code(code: &str) -> u16 {
    match code {
        "VALIDATION_ERROR" | "MISSING_PARAMETER" | "INVALID_PARAMETER" | "COMMAND_INJECTION" | "PATH_TRAVERSAL" => 400,
        "UNAUTHORIZED" => 401,
        "FORBIDDEN" => 403,
        "NOT_FOUND" | "GROUP_NOT_FOUND" | "NO_ROUTE" | "UNKNOWN_TOOL" => 404,
        "REQUEST_TIMEOUT" => 408,
        "RATE_LIMITED" => 429,
        "QUEUE_FULL" | "SERVICE_UNAVAILABLE" => 503,
        _ if code.ends_with("_FAILED") => 500,
        _ => 500,
    }
}

/// Normalizes a raw controller-produced JSON value into a well-formed
/// [`Envelope`], enforcing the §3/§4.10 invariants.
///
/// - `null` becomes `ErrorEnvelope{EMPTY_RESPONSE}`.
/// - A non-object value becomes `ErrorEnvelope{INVALID_RESPONSE}` carrying the
///   observed JSON type name.
/// - An object without `success` gets `success: true` injected.
/// - `success: false` without `error_code` gets `default_error_code` filled in.
/// - `success: false` without `error` gets a generic message filled in.
pub fn normalize(value: Value, default_error_code: &str) -> Envelope {
    let obj = match value {
        Value::Null => return Envelope::error("EMPTY_RESPONSE", "controller returned no response", None),
        Value::Object(map) => map,
        other => {
            return Envelope::error(
                "INVALID_RESPONSE",
                "controller returned a non-object response",
                Some(serde_json::json!({ "type": json_type_name(&other) })),
            );
        }
    };

    let success = obj.get("success").and_then(Value::as_bool).unwrap_or(true);
    if success {
        let mut fields = obj;
        fields.remove("success");
        Envelope::success(fields)
    } else {
        let error_code = obj
            .get("error_code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default_error_code.to_string());
        let error = obj
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "An unknown error occurred".to_string());
        let details = obj.get("details").cloned();
        Envelope::error(error_code, error, details)
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! `ProxyClient`: one instance per target service, owning the negotiated
//! auth posture and signing every outbound request (§4.12).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use reqwest::Client;
use scenectl_auth::signing;
use scenectl_contracts::ContractRegistry;
use scenectl_core::{normalize, CoreError, Envelope, HttpMethod};
use serde_json::{Map, Value};

use crate::debug_capture::DebugCapture;
use crate::negotiation::{negotiate, NegotiatedAuth};

/// Owns the HTTP client, the negotiated auth posture, and the contract
/// registry for one target service.
pub struct ProxyClient {
    http: Client,
    service_name: String,
    base_url: String,
    contracts: ContractRegistry,
    auth: Mutex<Option<NegotiatedAuth>>,
    renegotiated_once: AtomicBool,
    debug: DebugCapture,
}

impl ProxyClient {
    pub fn new(service_name: impl Into<String>, base_url: impl Into<String>, contracts: ContractRegistry) -> Self {
        Self {
            http: Client::new(),
            service_name: service_name.into(),
            base_url: base_url.into(),
            contracts,
            auth: Mutex::new(None),
            renegotiated_once: AtomicBool::new(false),
            debug: DebugCapture::from_env(),
        }
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    async fn ensure_negotiated(&self) {
        if self.auth.lock().is_some() {
            return;
        }
        let auth = negotiate(&self.http, &self.service_name, &self.base_url).await;
        *self.auth.lock() = Some(auth);
    }

    async fn renegotiate(&self) {
        let auth = negotiate(&self.http, &self.service_name, &self.base_url).await;
        *self.auth.lock() = Some(auth);
    }

    /// Invokes an MCP tool by name: contract lookup, request construction,
    /// signing, dispatch, and response normalization into an [`Envelope`].
    pub async fn call_tool(&self, mcp_tool: &str, arguments: Value) -> Envelope {
        let Some(contract) = self.contracts.by_mcp_tool(mcp_tool) else {
            return CoreError::UnknownTool { tool: mcp_tool.to_string() }.into();
        };
        let operation = contract.operation.as_str().to_string();
        let route = contract.http_route.clone();
        let method = contract.http_method;

        self.ensure_negotiated().await;
        let response = self.send_signed(method, &route, &operation, &arguments).await;

        match response {
            Ok(envelope) => envelope,
            Err(CoreError::Unauthorized { .. }) if !self.renegotiated_once.swap(true, Ordering::SeqCst) => {
                self.renegotiate().await;
                self.send_signed(method, &route, &operation, &arguments)
                    .await
                    .unwrap_or_else(|err| err.into())
            }
            Err(err) => err.into(),
        }
    }

    async fn send_signed(&self, method: HttpMethod, route: &str, operation: &str, arguments: &Value) -> Result<Envelope, CoreError> {
        let path = format!("/{route}");
        let (path_with_query, url, body) = match method {
            HttpMethod::Get => {
                let query = canonical_query(arguments);
                let path_with_query = if query.is_empty() { path.clone() } else { format!("{path}?{query}") };
                let url = format!("{}{}", self.base_url.trim_end_matches('/'), path_with_query);
                (path_with_query, url, None)
            }
            HttpMethod::Post => {
                let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
                (path, url, Some(arguments.clone()))
            }
        };

        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock is after epoch").as_secs_f64();
        let timestamp = format!("{timestamp}");

        let mut builder = match method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url).json(&body.clone().unwrap_or_else(|| Value::Object(Map::new()))),
        };

        let auth_snapshot = self.auth.lock().clone();
        if let Some(NegotiatedAuth::Hmac { secret, token }) = auth_snapshot {
            let signature = signing::sign(&secret, &method.to_string(), &path_with_query, &timestamp);
            builder = builder.header("x-timestamp", &timestamp).header("x-signature", &signature);
            if let Some(token) = token {
                builder = builder.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
            }
        }

        self.debug.record_request(&method.to_string(), &path_with_query);

        let response = builder.send().await.map_err(|err| CoreError::ConnectionError { reason: err.to_string() })?;
        let status = response.status().as_u16();
        self.debug.record_response(status);

        if status == 401 {
            return Err(CoreError::Unauthorized { reason: "target service rejected credentials".to_string() });
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let default_code = format!("{}_FAILED", operation.to_uppercase());
        Ok(normalize(body, &default_code))
    }
}

/// Serializes object-shaped arguments as `k=v` pairs sorted by key and
/// URL-encoded, matching the canonical string the target service signs
/// against (§4.12).
fn canonical_query(arguments: &Value) -> String {
    let Some(map) = arguments.as_object() else { return String::new() };
    let mut pairs: Vec<(&String, String)> = map
        .iter()
        .map(|(k, v)| (k, value_to_query_string(v)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encoding::utf8_percent_encode(k, percent_encoding::NON_ALPHANUMERIC), percent_encoding::utf8_percent_encode(&v, percent_encoding::NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&")
}

fn value_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scenectl_core::ToolContract;
    use wiremock::matchers::{method as method_matcher, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn canonical_query_sorts_keys() {
        let args = serde_json::json!({"radius": 10, "point": "5,0,2"});
        assert_eq!(canonical_query(&args), "point=5%2C0%2C2&radius=10");
    }

    #[test]
    fn canonical_query_of_empty_object_is_empty_string() {
        assert_eq!(canonical_query(&serde_json::json!({})), "");
    }

    fn single_tool_registry() -> ContractRegistry {
        ContractRegistry::load(vec![ToolContract::new("get_health", "health", HttpMethod::Get, "worldbuilder_health_check")])
    }

    #[tokio::test]
    async fn unauthenticated_service_round_trips_a_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method_matcher("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"}))).mount(&server).await;

        let client = ProxyClient::new("worldbuilder", server.uri(), single_tool_registry());
        let envelope = client.call_tool("worldbuilder_health_check", Value::Null).await;
        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn unknown_tool_returns_unknown_tool_error() {
        let server = MockServer::start().await;
        let client = ProxyClient::new("worldbuilder", server.uri(), single_tool_registry());
        let envelope = client.call_tool("not_a_real_tool", Value::Null).await;
        match envelope {
            Envelope::Error(e) => assert_eq!(e.error_code, "UNKNOWN_TOOL"),
            _ => panic!("expected an error envelope"),
        }
    }
}

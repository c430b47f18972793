//! Service auto-detection for services deployed in more than one protocol
//! variant (e.g. streaming via RTMP or SRT), §4.12. The proxy probes each
//! candidate base URL's authenticated `/health`; the first to answer
//! `success=true` becomes the active target.

use reqwest::Client;
use serde_json::Value;

use crate::negotiation::{negotiate, NegotiatedAuth};

/// Probes `candidates` in order and returns the first base URL whose
/// (possibly authenticated) `/health` reports `success=true`.
pub async fn discover_active_base_url(client: &Client, service_name: &str, candidates: &[String]) -> Option<String> {
    for base_url in candidates {
        let auth = negotiate(client, service_name, base_url).await;
        let health_url = format!("{}/health", base_url.trim_end_matches('/'));
        let mut request = client.get(&health_url);
        if let NegotiatedAuth::Hmac { token: Some(token), .. } = &auth {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let Ok(response) = request.send().await else {
            tracing::warn!(service = service_name, base_url, "candidate unreachable during auto-detection");
            continue;
        };
        let Ok(body) = response.json::<Value>().await else { continue };
        if body.get("success").and_then(Value::as_bool).unwrap_or(false) {
            tracing::info!(service = service_name, base_url, "selected active service variant");
            return Some(base_url.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn first_candidate_reporting_success_wins() {
        let dead = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false}))).mount(&dead).await;

        let alive = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true}))).mount(&alive).await;

        let client = Client::new();
        let candidates = vec![dead.uri(), alive.uri()];
        let chosen = discover_active_base_url(&client, "worldstreamer", &candidates).await;
        assert_eq!(chosen, Some(alive.uri()));
    }

    #[tokio::test]
    async fn no_candidate_reporting_success_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false}))).mount(&server).await;

        let client = Client::new();
        let candidates = vec![server.uri()];
        assert!(discover_active_base_url(&client, "worldstreamer", &candidates).await.is_none());
    }
}

//! 401-challenge authentication negotiation (§4.12).
//!
//! On first contact the proxy probes a target service's `/health` without
//! credentials. A `200` means auth is disabled; a `401` is parsed for
//! `WWW-Authenticate: HMAC-SHA256 realm="..."` and the corresponding
//! `SECRET`/`TOKEN` env vars are read. Any other outcome falls back to
//! environment-declared configuration without ever contacting the network.

use std::env;

use reqwest::Client;

/// The negotiated outbound auth posture for one target service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiatedAuth {
    Disabled,
    Hmac { secret: Vec<u8>, token: Option<String> },
}

impl NegotiatedAuth {
    pub fn is_disabled(&self) -> bool {
        matches!(self, NegotiatedAuth::Disabled)
    }
}

/// Probes `{base_url}/health` unauthenticated and negotiates the outbound
/// auth posture. Network or parse failures fall back to the environment.
pub async fn negotiate(client: &Client, service_name: &str, base_url: &str) -> NegotiatedAuth {
    let health_url = format!("{}/health", base_url.trim_end_matches('/'));
    match client.get(&health_url).send().await {
        Ok(response) if response.status().as_u16() == 200 => {
            tracing::info!(service = service_name, "no authentication required");
            NegotiatedAuth::Disabled
        }
        Ok(response) if response.status().as_u16() == 401 => {
            let challenge = response
                .headers()
                .get(reqwest::header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let auth = parse_challenge(service_name, challenge);
            tracing::info!(service = service_name, hmac_required = !auth.is_disabled(), "negotiated authentication");
            auth
        }
        Ok(response) => {
            tracing::warn!(service = service_name, status = response.status().as_u16(), "unexpected health response, falling back to env config");
            env_auth_config(service_name)
        }
        Err(err) => {
            tracing::warn!(service = service_name, error = %err, "auth negotiation failed, falling back to env config");
            env_auth_config(service_name)
        }
    }
}

fn parse_challenge(service_name: &str, www_authenticate: &str) -> NegotiatedAuth {
    if !www_authenticate.contains("HMAC-SHA256") {
        return NegotiatedAuth::Disabled;
    }
    env_auth_config(service_name)
}

/// Reads `SECRET`/`TOKEN` with a service-specific prefix (`AGENT_<SERVICE>_*`)
/// falling back to the global prefix (`AGENT_EXT_*`), per §6.
fn env_auth_config(service_name: &str) -> NegotiatedAuth {
    let secret = env_var(service_name, "HMAC_SECRET");
    let token = env_var(service_name, "AUTH_TOKEN");
    match secret {
        Some(secret) => NegotiatedAuth::Hmac { secret: secret.into_bytes(), token },
        None => NegotiatedAuth::Disabled,
    }
}

fn env_var(service_name: &str, suffix: &str) -> Option<String> {
    let service_var = format!("AGENT_{}_{suffix}", service_name.to_uppercase());
    env::var(&service_var).ok().or_else(|| env::var(format!("AGENT_EXT_{suffix}")).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn no_hmac_in_challenge_means_disabled() {
        assert_eq!(parse_challenge("worldbuilder", "Basic realm=\"x\""), NegotiatedAuth::Disabled);
    }

    #[test]
    #[serial]
    fn service_specific_env_var_wins_over_global() {
        // SAFETY: serialized via #[serial] so no other test observes a torn env.
        unsafe {
            env::set_var("AGENT_WORLDBUILDER_HMAC_SECRET", "specific");
            env::set_var("AGENT_EXT_HMAC_SECRET", "global");
        }
        let auth = env_auth_config("worldbuilder");
        assert_eq!(auth, NegotiatedAuth::Hmac { secret: b"specific".to_vec(), token: None });
        unsafe {
            env::remove_var("AGENT_WORLDBUILDER_HMAC_SECRET");
            env::remove_var("AGENT_EXT_HMAC_SECRET");
        }
    }

    #[test]
    #[serial]
    fn global_env_var_is_used_when_no_service_specific_override() {
        unsafe {
            env::remove_var("AGENT_WORLDBUILDER_HMAC_SECRET");
            env::set_var("AGENT_EXT_HMAC_SECRET", "global-only");
        }
        let auth = env_auth_config("worldbuilder");
        assert_eq!(auth, NegotiatedAuth::Hmac { secret: b"global-only".to_vec(), token: None });
        unsafe {
            env::remove_var("AGENT_EXT_HMAC_SECRET");
        }
    }

    #[test]
    #[serial]
    fn missing_secret_entirely_means_disabled() {
        unsafe {
            env::remove_var("AGENT_WORLDBUILDER_HMAC_SECRET");
            env::remove_var("AGENT_EXT_HMAC_SECRET");
        }
        assert_eq!(env_auth_config("worldbuilder"), NegotiatedAuth::Disabled);
    }

    #[tokio::test]
    async fn health_200_means_disabled() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let client = Client::new();
        let auth = negotiate(&client, "worldbuilder", &server.uri()).await;
        assert_eq!(auth, NegotiatedAuth::Disabled);
    }

    #[tokio::test]
    #[serial]
    async fn health_401_with_hmac_challenge_reads_env_secret() {
        unsafe {
            env::set_var("AGENT_WORLDBUILDER_HMAC_SECRET", "s3cr3t");
        }
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .respond_with(wiremock::ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"HMAC-SHA256 realm="isaac-sim""#))
            .mount(&server)
            .await;
        let client = Client::new();
        let auth = negotiate(&client, "worldbuilder", &server.uri()).await;
        assert_eq!(auth, NegotiatedAuth::Hmac { secret: b"s3cr3t".to_vec(), token: None });
        unsafe {
            env::remove_var("AGENT_WORLDBUILDER_HMAC_SECRET");
        }
    }
}

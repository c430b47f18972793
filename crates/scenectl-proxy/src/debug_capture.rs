//! Opt-in outbound request/response logging (§4.12, supplemented from the
//! original negotiator's debug file). Off unless `AGENT_MCP_HTTP_DEBUG` is
//! set to a truthy value; never part of the wire contract.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

const DEFAULT_DEBUG_FILE: &str = "/tmp/mcp_http_debug.log";

pub struct DebugCapture {
    file_path: Option<String>,
    pending_request: Mutex<Option<String>>,
}

impl DebugCapture {
    pub fn from_env() -> Self {
        let enabled = env::var("AGENT_MCP_HTTP_DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let file_path = enabled.then(|| env::var("AGENT_MCP_HTTP_DEBUG_FILE").unwrap_or_else(|_| DEFAULT_DEBUG_FILE.to_string()));
        Self { file_path, pending_request: Mutex::new(None) }
    }

    pub fn record_request(&self, method: &str, path_with_query: &str) {
        if self.file_path.is_none() {
            return;
        }
        *self.pending_request.lock().expect("debug capture mutex is never poisoned") = Some(format!("{method} {path_with_query}"));
    }

    pub fn record_response(&self, status: u16) {
        let Some(file_path) = &self.file_path else { return };
        let request_line = self.pending_request.lock().expect("debug capture mutex is never poisoned").take().unwrap_or_default();
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(file_path) else {
            tracing::warn!(path = %file_path, "could not open MCP HTTP debug log");
            return;
        };
        let _ = writeln!(file, "{request_line} -> {status}");
    }
}

//! The MCP proxy client (C12): negotiates authentication with a target
//! service via its 401 challenge, signs every forwarded request, exposes
//! each [`scenectl_core::ToolContract`] as an MCP tool, and normalizes
//! responses back into the shared [`scenectl_core::Envelope`] shape.

mod client;
mod debug_capture;
mod detection;
mod negotiation;
mod registration;

pub use client::ProxyClient;
pub use detection::discover_active_base_url;
pub use negotiation::{negotiate, NegotiatedAuth};
pub use registration::{build_tool_descriptors, McpToolDescriptor};

//! The identifiers shared by HTTP routes, MCP tool names, and controllers.

use std::fmt;

/// An HTTP method a contract may be bound to. The transport surface is
/// deliberately narrow: reads are `GET`, mutations are `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// A symbolic, service-unique action identifier (e.g. `add_element`).
///
/// Distinct `ToolContract`s may share an `Operation` only to form a
/// documented alias (two MCP tool names resolving to the same handler).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Operation(pub String);

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operation name upper-cased, for building the `<OP>_FAILED` default
    /// error code.
    pub fn shout(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Operation {
    fn from(s: &str) -> Self {
        Operation::new(s)
    }
}

/// The 4-tuple binding a logical `operation` to its HTTP route, method, and
/// MCP tool name. Immutable once loaded by a `ContractRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolContract {
    pub operation: Operation,
    pub http_route: String,
    pub http_method: HttpMethod,
    pub mcp_tool: String,
}

impl ToolContract {
    pub fn new(
        operation: impl Into<String>,
        http_route: impl Into<String>,
        http_method: HttpMethod,
        mcp_tool: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::new(operation),
            http_route: http_route.into(),
            http_method,
            mcp_tool: mcp_tool.into(),
        }
    }
}

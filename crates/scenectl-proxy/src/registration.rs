//! Builds the MCP tool descriptors exposed to agent clients, one per
//! [`ToolContract`] (§4.12). The input schema is description-only: it
//! documents shape and intent but enforces no length or range constraints,
//! since those checks already live server-side in the Validator.

use scenectl_contracts::ContractRegistry;
use scenectl_core::HttpMethod;
use serde_json::{json, Value};

/// One exposed MCP tool: `name`, human-readable `description`, and a
/// permissive `input_schema` accepting any object.
#[derive(Debug, Clone)]
pub struct McpToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Builds one descriptor per contract in `registry`.
pub fn build_tool_descriptors(registry: &ContractRegistry) -> Vec<McpToolDescriptor> {
    registry.contracts().iter().map(describe).collect()
}

fn describe(contract: &scenectl_core::ToolContract) -> McpToolDescriptor {
    let verb = match contract.http_method {
        HttpMethod::Get => "Queries",
        HttpMethod::Post => "Invokes",
    };
    McpToolDescriptor {
        name: contract.mcp_tool.clone(),
        description: format!("{verb} the `{}` operation (`{} /{}`).", contract.operation, contract.http_method, contract.http_route),
        input_schema: json!({
            "type": "object",
            "additionalProperties": true,
            "description": "Arguments are forwarded to the target service verbatim; see the operation's documented fields.",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenectl_contracts::tables;

    #[test]
    fn every_contract_produces_one_tool_named_after_its_mcp_tool() {
        let registry = ContractRegistry::load(tables::worldbuilder());
        let descriptors = build_tool_descriptors(&registry);
        assert_eq!(descriptors.len(), registry.contracts().len());
        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        for contract in registry.contracts() {
            assert!(names.contains(&contract.mcp_tool.as_str()));
        }
    }

    #[test]
    fn input_schema_accepts_any_object_with_no_length_constraints() {
        let registry = ContractRegistry::load(tables::worldbuilder());
        let descriptors = build_tool_descriptors(&registry);
        for descriptor in &descriptors {
            assert_eq!(descriptor.input_schema["type"], "object");
            assert_eq!(descriptor.input_schema["additionalProperties"], true);
            assert!(descriptor.input_schema.get("minLength").is_none());
            assert!(descriptor.input_schema.get("maxLength").is_none());
        }
    }
}

//! Builds the `/openapi.json` document served unauthenticated alongside the
//! contract-driven router. Generated once at startup from the same
//! [`ContractRegistry`] the router dispatches through, so the two can never
//! drift apart.

use scenectl_contracts::ContractRegistry;
use scenectl_core::HttpMethod;
use serde_json::{json, Map, Value};

pub fn build(service_name: &str, registry: &ContractRegistry) -> Value {
    let mut paths = Map::new();
    for contract in registry.contracts() {
        let path_key = format!("/{}", contract.http_route);
        let method_key = match contract.http_method {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
        };
        let operation = json!({
            "operationId": contract.operation.as_str(),
            "x-mcp-tool": contract.mcp_tool,
            "responses": {
                "200": { "description": "success or error envelope" },
            },
        });
        let entry = paths.entry(path_key).or_insert_with(|| Value::Object(Map::new()));
        entry.as_object_mut().expect("entry is always an object").insert(method_key.to_string(), operation);
    }

    json!({
        "openapi": "3.0.3",
        "info": { "title": format!("{service_name} control plane"), "version": "0.1.0" },
        "paths": Value::Object(paths),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenectl_contracts::tables;

    #[test]
    fn every_contract_route_appears_as_a_path() {
        let registry = ContractRegistry::load(tables::worldbuilder());
        let doc = build("worldbuilder", &registry);
        assert!(doc["paths"]["/health"]["get"].is_object());
        assert!(doc["paths"]["/add_element"]["post"].is_object());
    }
}

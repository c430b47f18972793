//! `ContractRegistry` (C11): the `operation ↔ http_route ↔ mcp_tool` lookup
//! every HTTP worker and MCP proxy dispatches through.

pub mod tables;

use std::collections::HashMap;

use scenectl_core::{HttpMethod, ToolContract};

/// Loaded once at startup from a static per-service table. Two lookup maps:
/// by `(route, method)` for HTTP ingress, and by `mcp_tool` for the proxy.
pub struct ContractRegistry {
    contracts: Vec<ToolContract>,
    route_map: HashMap<(String, HttpMethod), usize>,
    mcp_map: HashMap<String, usize>,
}

impl ContractRegistry {
    pub fn load(contracts: Vec<ToolContract>) -> Self {
        let mut route_map = HashMap::new();
        let mut mcp_map = HashMap::new();
        for (index, contract) in contracts.iter().enumerate() {
            route_map.insert((contract.http_route.clone(), contract.http_method), index);
            mcp_map.insert(contract.mcp_tool.clone(), index);
        }
        Self { contracts, route_map, mcp_map }
    }

    pub fn by_route(&self, route: &str, method: HttpMethod) -> Option<&ToolContract> {
        self.route_map.get(&(route.to_string(), method)).map(|&i| &self.contracts[i])
    }

    pub fn by_mcp_tool(&self, mcp_tool: &str) -> Option<&ToolContract> {
        self.mcp_map.get(mcp_tool).map(|&i| &self.contracts[i])
    }

    pub fn contracts(&self) -> &[ToolContract] {
        &self.contracts
    }

    /// Asserts every `operation` named by a contract appears in
    /// `implemented_operations`. Intended to run once at startup (and in the
    /// test suite) so a missing controller handler fails loudly rather than
    /// 404ing at request time.
    pub fn self_check(&self, implemented_operations: &[&str]) -> Result<(), Vec<String>> {
        let missing: Vec<String> = self
            .contracts
            .iter()
            .map(|c| c.operation.as_str())
            .filter(|op| !implemented_operations.contains(op))
            .map(str::to_string)
            .collect();
        if missing.is_empty() { Ok(()) } else { Err(missing) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn worldbuilder_table_self_checks_against_its_own_operations() {
        let registry = ContractRegistry::load(tables::worldbuilder());
        let operations: Vec<&str> = registry.contracts().iter().map(|c| c.operation.as_str()).collect();
        assert!(registry.self_check(&operations).is_ok());
    }

    #[test]
    fn self_check_reports_missing_operations() {
        let registry = ContractRegistry::load(tables::worldbuilder());
        let err = registry.self_check(&["get_health"]).unwrap_err();
        assert!(err.contains(&"add_element".to_string()));
    }

    #[test]
    fn mcp_tool_aliases_resolve_to_the_same_operation() {
        let registry = ContractRegistry::load(tables::worldsurveyor());
        let primary = registry.by_mcp_tool("worldsurveyor_health_check").unwrap();
        let alias = registry.by_mcp_tool("worldsurveyor_health").unwrap();
        assert_eq!(primary.operation, alias.operation);
        assert_eq!(primary.http_route, alias.http_route);
    }

    #[test]
    fn duplicate_http_route_resolves_to_the_last_declared_alias() {
        let registry = ContractRegistry::load(tables::worldrecorder());
        let resolved = registry.by_route("health", HttpMethod::Get).unwrap();
        assert_eq!(resolved.mcp_tool, "worldrecorder_health");
    }

    #[test]
    fn every_mcp_tool_name_is_unique() {
        for contracts in [
            tables::worldbuilder(),
            tables::worldsurveyor(),
            tables::worldrecorder(),
            tables::worldstreamer(),
            tables::worldviewer(),
        ] {
            let registry = ContractRegistry::load(contracts);
            assert_eq!(registry.mcp_map.len(), registry.contracts().len());
        }
    }

    #[test]
    fn worldviewer_table_self_checks_against_its_own_operations() {
        let registry = ContractRegistry::load(tables::worldviewer());
        let operations: Vec<&str> = registry.contracts().iter().map(|c| c.operation.as_str()).collect();
        assert!(registry.self_check(&operations).is_ok());
    }
}

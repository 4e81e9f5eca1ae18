//! Static tool catalog advertised on `tools/list`.

use serde::Serialize;
use serde_json::{json, Value};

pub const SKILLZ_SEARCH: &str = "skillz_search";
pub const SKILLZ_INFO: &str = "skillz_info";
pub const SKILLZ_CALL: &str = "skillz_call";
pub const SKILLZ_REVIEWS: &str = "skillz_reviews";
#[cfg(feature = "groups")]
pub const SKILLZ_GROUPS: &str = "skillz_groups";
#[cfg(feature = "groups")]
pub const SKILLZ_GROUP: &str = "skillz_group";

/// Definition of a tool exposed to the MCP host.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Build the ordered list of tool descriptors.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    #[cfg_attr(not(feature = "groups"), allow(unused_mut))]
    let mut tools = vec![
        ToolDescriptor {
            name: SKILLZ_SEARCH,
            description: "Search the Skillz Market for skills by name or description",
            input_schema: search_schema(),
        },
        ToolDescriptor {
            name: SKILLZ_INFO,
            description: "Get detailed information about a specific skill including price, endpoint, and schema",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Skill slug (unique identifier)" }
                },
                "required": ["slug"]
            }),
        },
        ToolDescriptor {
            name: SKILLZ_CALL,
            description: "Call a skill with automatic USDC payment on Base network via x402 protocol. Requires SKILLZ_PRIVATE_KEY to be configured.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Skill slug" },
                    "input": { "type": "object", "description": "Input data for the skill" }
                },
                "required": ["slug", "input"]
            }),
        },
        ToolDescriptor {
            name: SKILLZ_REVIEWS,
            description: "Get reviews for a specific skill",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Skill slug" }
                },
                "required": ["slug"]
            }),
        },
    ];

    #[cfg(feature = "groups")]
    tools.extend([
        ToolDescriptor {
            name: SKILLZ_GROUPS,
            description: "List skill groups, optionally filtered by creator",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "creator": { "type": "string", "description": "Filter by creator wallet address (optional)" }
                },
                "required": []
            }),
        },
        ToolDescriptor {
            name: SKILLZ_GROUP,
            description: "Get details about a specific skill group including its skills",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Group slug" },
                    "creator": { "type": "string", "description": "Creator wallet address (optional, for scoping)" }
                },
                "required": ["slug"]
            }),
        },
    ]);

    tools
}

#[cfg(feature = "groups")]
fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Search query" },
            "category": { "type": "string", "description": "Filter by category (optional)" },
            "group": { "type": "string", "description": "Filter by group slug (optional)" },
            "creator": { "type": "string", "description": "Filter by creator wallet address (optional)" }
        },
        "required": ["query"]
    })
}

#[cfg(not(feature = "groups"))]
fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Search query" },
            "category": { "type": "string", "description": "Filter by category (optional)" }
        },
        "required": ["query"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_ordered() {
        let names: Vec<_> = tool_descriptors().iter().map(|t| t.name).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[..4], [SKILLZ_SEARCH, SKILLZ_INFO, SKILLZ_CALL, SKILLZ_REVIEWS]);

        #[cfg(feature = "groups")]
        assert_eq!(names[4..], [SKILLZ_GROUPS, SKILLZ_GROUP]);
        #[cfg(not(feature = "groups"))]
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn every_required_field_is_declared() {
        for tool in tool_descriptors() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            let properties = schema["properties"].as_object().unwrap();
            for field in schema["required"].as_array().unwrap() {
                let field = field.as_str().unwrap();
                assert!(properties.contains_key(field), "{}.{}", tool.name, field);
            }
        }
    }

    #[test]
    fn serializes_with_mcp_field_names() {
        let json = serde_json::to_value(&tool_descriptors()[0]).unwrap();
        assert_eq!(json["name"], SKILLZ_SEARCH);
        assert!(json.get("inputSchema").is_some());
        assert!(json.get("input_schema").is_none());
    }
}

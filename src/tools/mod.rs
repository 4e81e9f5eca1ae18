pub mod args;
pub mod registry;

pub use args::{ArgsError, ToolRequest};
pub use registry::{tool_descriptors, ToolDescriptor};

use crate::identity::Wallet;
use crate::market::{MarketClient, MarketError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Returned by `skillz_call` when no wallet is configured.
pub const NO_WALLET_MESSAGE: &str =
    "Error: No wallet configured. Set SKILLZ_PRIVATE_KEY environment variable for x402 payments.";

// ---------------------------------------------------------------------------
// Context and results
// ---------------------------------------------------------------------------

/// Handles shared by every dispatch. Read-only after startup.
#[derive(Clone)]
pub struct ToolContext {
    pub client: Arc<dyn MarketClient>,
    pub wallet: Option<Wallet>,
}

impl ToolContext {
    pub fn new(client: Arc<dyn MarketClient>, wallet: Option<Wallet>) -> Self {
        Self { client, wallet }
    }
}

/// Content block in a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

/// Result of a tool call, serialized as the MCP `tools/call` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(msg: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text",
                text: msg.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(msg)
        }
    }

    /// Pretty-printed JSON (2-space indent, key order as received).
    pub fn json(value: &Value) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Error serializing result: {}", e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Execute a tool call by name. Never fails: every outcome is a `ToolResult`.
pub async fn dispatch(name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
    let request = match ToolRequest::decode(name, args) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected tool call: {}", e);
            return ToolResult::error(e.to_string());
        }
    };

    if request.requires_wallet() && ctx.wallet.is_none() {
        warn!("{} refused: no wallet configured", request.tool_name());
        return ToolResult::error(NO_WALLET_MESSAGE);
    }

    debug!("Dispatching {}", request.tool_name());
    let client = ctx.client.as_ref();

    let outcome = match &request {
        ToolRequest::Search(args) => client.search(&args.query, &args.filters()).await,
        ToolRequest::Info(args) => client.info(&args.slug).await,
        ToolRequest::Call(args) => {
            client
                .call(&args.slug, &Value::Object(args.input.clone()))
                .await
        }
        ToolRequest::Reviews(args) => client.get_reviews(&args.slug).await,
        #[cfg(feature = "groups")]
        ToolRequest::Groups(args) => client.get_groups(args.creator.as_deref()).await,
        #[cfg(feature = "groups")]
        ToolRequest::Group(args) => {
            client
                .get_group(&args.slug, args.creator.as_deref())
                .await
        }
    };

    match outcome {
        Ok(value) => ToolResult::json(&value),
        Err(e) => {
            warn!("{} failed: {}", request.tool_name(), e);
            ToolResult::error(format!("Error calling skill: {}", error_text(&e)))
        }
    }
}

fn error_text(error: &MarketError) -> String {
    let text = error.to_string();
    if text.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_serializes_as_mcp_content() {
        let ok = serde_json::to_value(ToolResult::text("hi")).unwrap();
        assert_eq!(ok, json!({ "content": [{ "type": "text", "text": "hi" }] }));

        let err = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(err["isError"], true);
    }

    #[test]
    fn json_result_is_pretty_with_stable_order() {
        let result = ToolResult::json(&json!({ "name": "abc", "price": 1 }));
        assert_eq!(result.content[0].text, "{\n  \"name\": \"abc\",\n  \"price\": 1\n}");
        assert!(!result.is_error);
    }

    #[test]
    fn empty_error_text_falls_back() {
        assert_eq!(error_text(&MarketError::Skill(String::new())), "Unknown error");
        assert_eq!(
            error_text(&MarketError::Skill("insufficient funds".into())),
            "insufficient funds"
        );
    }
}

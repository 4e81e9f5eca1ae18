//! Typed tool requests decoded from the raw `tools/call` argument object.
//!
//! Each tool name maps to exactly one [`ToolRequest`] variant. Decoding fails
//! closed: missing required fields and wrongly typed fields are rejected
//! before the marketplace client is ever reached. Keys a tool does not
//! declare are ignored, matching the open `inputSchema` objects in the
//! catalog.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::registry::*;
use crate::market::SearchFilters;

/// Why a tool call could not be turned into a [`ToolRequest`].
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    Invalid { tool: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[cfg(feature = "groups")]
    #[serde(default)]
    pub group: Option<String>,
    #[cfg(feature = "groups")]
    #[serde(default)]
    pub creator: Option<String>,
}

impl SearchArgs {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            category: self.category.clone(),
            #[cfg(feature = "groups")]
            group: self.group.clone(),
            #[cfg(feature = "groups")]
            creator: self.creator.clone(),
            #[cfg(not(feature = "groups"))]
            group: None,
            #[cfg(not(feature = "groups"))]
            creator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlugArgs {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallArgs {
    pub slug: String,
    pub input: Map<String, Value>,
}

#[cfg(feature = "groups")]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupsArgs {
    #[serde(default)]
    pub creator: Option<String>,
}

#[cfg(feature = "groups")]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupArgs {
    pub slug: String,
    #[serde(default)]
    pub creator: Option<String>,
}

/// One decoded tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Search(SearchArgs),
    Info(SlugArgs),
    Call(CallArgs),
    Reviews(SlugArgs),
    #[cfg(feature = "groups")]
    Groups(GroupsArgs),
    #[cfg(feature = "groups")]
    Group(GroupArgs),
}

impl ToolRequest {
    /// Decode the arguments for the named tool. `null` arguments count as `{}`.
    pub fn decode(name: &str, args: Value) -> Result<Self, ArgsError> {
        let args = if args.is_null() {
            Value::Object(Map::new())
        } else {
            args
        };

        match name {
            SKILLZ_SEARCH => parse(SKILLZ_SEARCH, args).map(Self::Search),
            SKILLZ_INFO => parse(SKILLZ_INFO, args).map(Self::Info),
            SKILLZ_CALL => parse(SKILLZ_CALL, args).map(Self::Call),
            SKILLZ_REVIEWS => parse(SKILLZ_REVIEWS, args).map(Self::Reviews),
            #[cfg(feature = "groups")]
            SKILLZ_GROUPS => parse(SKILLZ_GROUPS, args).map(Self::Groups),
            #[cfg(feature = "groups")]
            SKILLZ_GROUP => parse(SKILLZ_GROUP, args).map(Self::Group),
            _ => Err(ArgsError::UnknownTool(name.to_string())),
        }
    }

    /// Registry name of the tool this request targets.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Search(_) => SKILLZ_SEARCH,
            Self::Info(_) => SKILLZ_INFO,
            Self::Call(_) => SKILLZ_CALL,
            Self::Reviews(_) => SKILLZ_REVIEWS,
            #[cfg(feature = "groups")]
            Self::Groups(_) => SKILLZ_GROUPS,
            #[cfg(feature = "groups")]
            Self::Group(_) => SKILLZ_GROUP,
        }
    }

    /// Paid tools cannot run without a configured wallet.
    pub fn requires_wallet(&self) -> bool {
        matches!(self, Self::Call(_))
    }
}

fn parse<T: DeserializeOwned>(tool: &'static str, args: Value) -> Result<T, ArgsError> {
    // serde would otherwise accept a JSON array as a positional struct.
    if !args.is_object() {
        return Err(ArgsError::Invalid {
            tool,
            reason: "arguments must be a JSON object".into(),
        });
    }
    serde_json::from_value(args).map_err(|e| ArgsError::Invalid {
        tool,
        reason: e.to_string(),
    })
}

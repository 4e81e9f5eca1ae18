//! Skillz Market MCP server.
//!
//! Exposes marketplace search, skill info, reviews, group browsing and paid
//! skill calls (x402, USDC on Base) as MCP tools over stdio.

pub mod config;
pub mod identity;
pub mod logging;
pub mod market;
pub mod mcp;
pub mod tools;

//! Shared test fixtures: a recording stub marketplace client.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use skillz_mcp::identity::Wallet;
use skillz_mcp::market::{MarketClient, MarketError, SearchFilters};
use skillz_mcp::tools::ToolContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Deterministic client that counts every operation it receives.
#[derive(Default)]
pub struct StubClient {
    pub response: Value,
    /// When set, `call` fails with `MarketError::Skill(message)`.
    pub call_error: Option<String>,
    /// When set, `info` never resolves.
    pub hang_info: bool,
    pub search_count: AtomicUsize,
    pub info_count: AtomicUsize,
    pub call_count: AtomicUsize,
    pub reviews_count: AtomicUsize,
    pub groups_count: AtomicUsize,
    pub group_count: AtomicUsize,
    pub last_search: Mutex<Option<(String, SearchFilters)>>,
    pub last_call: Mutex<Option<(String, Value)>>,
    pub last_group: Mutex<Option<(String, Option<String>)>>,
}

impl StubClient {
    pub fn returning(response: Value) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    pub fn failing_calls(message: &str) -> Self {
        Self {
            response: json!({}),
            call_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn hanging_info() -> Self {
        Self {
            response: json!({}),
            hang_info: true,
            ..Self::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.search_count,
            &self.info_count,
            &self.call_count,
            &self.reviews_count,
            &self.groups_count,
            &self.group_count,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[async_trait]
impl MarketClient for StubClient {
    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Value, MarketError> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().unwrap() = Some((query.to_string(), filters.clone()));
        Ok(self.response.clone())
    }

    async fn info(&self, _slug: &str) -> Result<Value, MarketError> {
        self.info_count.fetch_add(1, Ordering::SeqCst);
        if self.hang_info {
            std::future::pending::<()>().await;
        }
        Ok(self.response.clone())
    }

    async fn call(&self, slug: &str, input: &Value) -> Result<Value, MarketError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((slug.to_string(), input.clone()));
        match &self.call_error {
            Some(message) => Err(MarketError::Skill(message.clone())),
            None => Ok(self.response.clone()),
        }
    }

    async fn get_reviews(&self, _slug: &str) -> Result<Value, MarketError> {
        self.reviews_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    async fn get_groups(&self, _creator: Option<&str>) -> Result<Value, MarketError> {
        self.groups_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    async fn get_group(&self, slug: &str, creator: Option<&str>) -> Result<Value, MarketError> {
        self.group_count.fetch_add(1, Ordering::SeqCst);
        *self.last_group.lock().unwrap() = Some((slug.to_string(), creator.map(str::to_string)));
        Ok(self.response.clone())
    }
}

pub fn wallet() -> Wallet {
    Wallet::from_private_key(TEST_KEY).unwrap()
}

pub fn context(client: &Arc<StubClient>, wallet: Option<Wallet>) -> ToolContext {
    ToolContext::new(client.clone(), wallet)
}

/// Minimal valid arguments for each tool in the catalog.
pub fn valid_args(tool: &str) -> Value {
    match tool {
        "skillz_search" => json!({ "query": "summarize" }),
        "skillz_info" | "skillz_reviews" | "skillz_group" => json!({ "slug": "abc" }),
        "skillz_call" => json!({ "slug": "abc", "input": { "text": "hello" } }),
        "skillz_groups" => json!({}),
        other => panic!("no fixture for {}", other),
    }
}

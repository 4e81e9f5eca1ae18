//! Skillz Market API client: the seam the tool dispatcher talks to, plus
//! the default HTTP implementation.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::x402::{self, PaymentRequired};
use super::{MarketError, SearchFilters};
use crate::identity::Wallet;

/// Marketplace operations exposed as MCP tools.
///
/// Every operation resolves to the API's JSON value, unchanged, or a typed
/// failure. Implementations own retries, timeouts and payment.
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Search skills by name or description.
    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Value, MarketError>;

    /// Skill details including price, endpoint and schema.
    async fn info(&self, slug: &str) -> Result<Value, MarketError>;

    /// Invoke a skill, paying for it if the endpoint asks.
    async fn call(&self, slug: &str, input: &Value) -> Result<Value, MarketError>;

    async fn get_reviews(&self, slug: &str) -> Result<Value, MarketError>;

    async fn get_groups(&self, creator: Option<&str>) -> Result<Value, MarketError>;

    async fn get_group(&self, slug: &str, creator: Option<&str>) -> Result<Value, MarketError>;
}

/// Construction-time settings for [`SkillzClient`].
#[derive(Debug, Clone)]
pub struct SkillzClientConfig {
    pub api_url: String,
    pub wallet: Option<Wallet>,
    pub timeout: Option<Duration>,
}

/// Skillz Market HTTP client.
#[derive(Debug, Clone)]
pub struct SkillzClient {
    base_url: Url,
    wallet: Option<Wallet>,
    http: reqwest::Client,
}

impl SkillzClient {
    /// Create a new Skillz Market client.
    pub fn new(config: SkillzClientConfig) -> Result<Self, MarketError> {
        let base_url = Url::parse(config.api_url.trim_end_matches('/'))
            .map_err(|e| MarketError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            wallet: config.wallet,
            http: builder.build()?,
        })
    }

    /// Build an API URL from path segments; each segment is percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url, MarketError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value, MarketError> {
        let url = self.api_url(segments)?;
        debug!("Skillz GET {}", url.path());

        let resp = self.http.get(url).query(query).send().await?;
        read_json(resp).await
    }

    /// Resolve the endpoint a skill is invoked at.
    async fn skill_endpoint(&self, slug: &str) -> Result<Url, MarketError> {
        let skill = self.info(slug).await?;
        let endpoint = skill
            .get("endpoint")
            .and_then(Value::as_str)
            .ok_or_else(|| MarketError::Decode(format!("skill '{}' has no endpoint", slug)))?;

        self.base_url
            .join(endpoint)
            .map_err(|e| MarketError::InvalidUrl(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl MarketClient for SkillzClient {
    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Value, MarketError> {
        let mut params = vec![("q", query)];
        params.extend(filters.query_pairs());
        self.get_json(&["skills", "search"], &params).await
    }

    async fn info(&self, slug: &str) -> Result<Value, MarketError> {
        self.get_json(&["skills", slug], &[]).await
    }

    async fn call(&self, slug: &str, input: &Value) -> Result<Value, MarketError> {
        let wallet = self.wallet.as_ref().ok_or(MarketError::WalletRequired)?;
        let endpoint = self.skill_endpoint(slug).await?;

        debug!("Skillz call {} -> {}", slug, endpoint);
        let resp = self.http.post(endpoint.clone()).json(input).send().await?;
        if resp.status() != StatusCode::PAYMENT_REQUIRED {
            return read_json(resp).await;
        }

        let required: PaymentRequired = resp
            .json()
            .await
            .map_err(|e| MarketError::Decode(format!("402 payment requirements: {}", e)))?;
        let header = x402::payment_header(wallet, &required)?;

        let resp = self
            .http
            .post(endpoint)
            .header(x402::PAYMENT_HEADER, header)
            .json(input)
            .send()
            .await?;

        if resp.status() == StatusCode::PAYMENT_REQUIRED {
            let body = resp.text().await.unwrap_or_default();
            return Err(MarketError::Payment(error_message(&body, "payment rejected")));
        }

        read_json(resp).await
    }

    async fn get_reviews(&self, slug: &str) -> Result<Value, MarketError> {
        self.get_json(&["skills", slug, "reviews"], &[]).await
    }

    async fn get_groups(&self, creator: Option<&str>) -> Result<Value, MarketError> {
        let query: Vec<(&str, &str)> = creator.map(|c| ("creator", c)).into_iter().collect();
        self.get_json(&["groups"], &query).await
    }

    async fn get_group(&self, slug: &str, creator: Option<&str>) -> Result<Value, MarketError> {
        let query: Vec<(&str, &str)> = creator.map(|c| ("creator", c)).into_iter().collect();
        self.get_json(&["groups", slug], &query).await
    }
}

/// Decode a successful JSON body or turn a failure status into `MarketError::Api`.
async fn read_json(resp: reqwest::Response) -> Result<Value, MarketError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let fallback = status.canonical_reason().unwrap_or("request failed");
        return Err(MarketError::Api {
            status: status.as_u16(),
            message: error_message(&body, fallback),
        });
    }

    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| MarketError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = json.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

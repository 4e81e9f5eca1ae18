//! Typed failures returned by marketplace client operations.

/// Every `MarketClient` operation resolves to a value or one of these.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("a wallet is required for paid skill calls")]
    WalletRequired,

    #[error("payment failed: {0}")]
    Payment(String),

    /// Failure reported by a skill or an alternative client implementation.
    #[error("{0}")]
    Skill(String),
}

pub mod client;
pub mod error;
pub mod types;
pub mod x402;

pub use client::{MarketClient, SkillzClient, SkillzClientConfig};
pub use error::MarketError;
pub use types::SearchFilters;

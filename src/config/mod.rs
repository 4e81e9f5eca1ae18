pub mod schema;

pub use schema::ServerConfig;

/// Public Skillz Market API used when `SKILLZ_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.skillzmarket.com";

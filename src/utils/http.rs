// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ApiConfig;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("travelog/", env!("CARGO_PKG_VERSION"));

/// Create a configured asynchronous HTTP client.
///
/// Cookies are kept between requests so session cookies set by the
/// backend travel along with the bearer token.
pub fn create_async_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_store(true)
        .build()?;
    Ok(client)
}

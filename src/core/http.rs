use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::config::EngineConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared client for artifact downloads. Bodies are hashed as they stream,
/// so transfer encodings that rewrite them are refused.
pub fn build_http_client(config: &EngineConfig) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(concat!("InterfaceOficial-Core/", env!("CARGO_PKG_VERSION")))
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

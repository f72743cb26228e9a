use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::config::EngineConfig;

const USER_AGENT: &str = concat!("carteira_metrics/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client for CSV downloads. The first caller's config fixes
/// the client-wide timeout; each request still applies its own.
pub fn http_client(config: &EngineConfig) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(config))
}

fn build_client(config: &EngineConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.csv_fetch_timeout)
        .connect_timeout(config.csv_fetch_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build http client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_is_built_once() {
        let config = EngineConfig {
            csv_fetch_timeout: Duration::from_secs(3),
            ..EngineConfig::default()
        };
        let first = http_client(&config).expect("client");
        let second = http_client(&EngineConfig::default()).expect("client");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn builds_with_configured_timeout() {
        let config = EngineConfig {
            csv_fetch_timeout: Duration::from_secs(1),
            ..EngineConfig::default()
        };
        assert!(build_client(&config).is_ok());
    }
}

//! Common test utilities

use std::path::PathBuf;

use doffin::config::Config;
use doffin::utils::retry::RetryPolicy;

/// Configuration pointing at a mock server, with no pacing and short delays
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = base_url.to_string();
    config.scraper.min_interval_ms = 0;
    config.scraper.request_timeout_secs = 5;
    config.retry = RetryPolicy::with_delays(3, 10, 50);
    config
}

/// Same as [`test_config`] with a pacing interval
#[allow(dead_code)]
pub fn paced_config(base_url: &str, min_interval_ms: u64) -> Config {
    let mut config = test_config(base_url);
    config.scraper.min_interval_ms = min_interval_ms;
    config
}

/// Load an HTML fixture from `tests/fixtures/html`
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/html")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

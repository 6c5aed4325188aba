use std::time::Duration;

use log::*;
use xpg_common::Secret;

pub const DEFAULT_OFFRAMP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct OffRampConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl OffRampConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("XPG_OFFRAMP_URL").unwrap_or_else(|_| {
            warn!("🏦️ XPG_OFFRAMP_URL not set, using the sandbox endpoint as default");
            "https://api.sandbox.offramp.example.com/v1".to_string()
        });
        let api_key = Secret::new(std::env::var("XPG_OFFRAMP_API_KEY").unwrap_or_else(|_| {
            warn!("🏦️ XPG_OFFRAMP_API_KEY not set, using (probably useless) default");
            "00000000-0000-0000-0000-000000000000".to_string()
        }));
        let timeout = std::env::var("XPG_OFFRAMP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                debug!("🏦️ XPG_OFFRAMP_TIMEOUT_SECS not set, using {DEFAULT_OFFRAMP_TIMEOUT_SECS}s");
                Duration::from_secs(DEFAULT_OFFRAMP_TIMEOUT_SECS)
            });
        Self { base_url, api_key, timeout }
    }
}

use std::time::Duration;

use log::*;
use xpg_common::Secret;

pub const DEFAULT_WALLET_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct WalletConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    /// The provider-side identifier of the master custodial wallet that all merchant deposit
    /// addresses hang off.
    pub wallet_id: String,
    /// The provider-side identifier of the USDC asset within that wallet.
    pub asset_id: String,
    pub timeout: Duration,
}

impl WalletConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("XPG_WALLET_URL").unwrap_or_else(|_| {
            warn!("🔮️ XPG_WALLET_URL not set, using the sandbox endpoint as default");
            "https://api.sandbox.custodial.example.com/v1".to_string()
        });
        let api_key = Secret::new(std::env::var("XPG_WALLET_API_KEY").unwrap_or_else(|_| {
            warn!("🔮️ XPG_WALLET_API_KEY not set, using (probably useless) default");
            "00000000-0000-0000-0000-000000000000".to_string()
        }));
        let wallet_id = std::env::var("XPG_WALLET_ID").unwrap_or_else(|_| {
            warn!("🔮️ XPG_WALLET_ID not set, using (probably useless) default");
            "wallet-000".to_string()
        });
        let asset_id = std::env::var("XPG_WALLET_ASSET_ID").unwrap_or_else(|_| {
            warn!("🔮️ XPG_WALLET_ASSET_ID not set, using (probably useless) default");
            "asset-usdc".to_string()
        });
        let timeout = std::env::var("XPG_WALLET_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                debug!("🔮️ XPG_WALLET_TIMEOUT_SECS not set, using {DEFAULT_WALLET_TIMEOUT_SECS}s");
                Duration::from_secs(DEFAULT_WALLET_TIMEOUT_SECS)
            });
        Self { base_url, api_key, wallet_id, asset_id, timeout }
    }
}

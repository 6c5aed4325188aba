use std::env;

use chrono::Duration;
use custodial_tools::WalletConfig;
use log::*;
use offramp_tools::OffRampConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use xpg_common::Secret;

const DEFAULT_XPG_HOST: &str = "127.0.0.1";
const DEFAULT_XPG_PORT: u16 = 8420;
const DEFAULT_TOKEN_VALIDITY_HOURS: i64 = 24;
const DEFAULT_FIAT_CURRENCY: &str = "NGN";
const DEFAULT_NETWORK: &str = "base";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    /// Fiat currency that off-ramp payouts are quoted and settled in.
    pub fiat_currency: String,
    /// The chain network deposits and withdrawals run on.
    pub network: String,
    pub offramp_config: OffRampConfig,
    pub wallet_config: WalletConfig,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_signing_key: Secret<String>,
    pub token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_signing_key: Secret::new(String::default()), token_validity: Duration::hours(DEFAULT_TOKEN_VALIDITY_HOURS) }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    pub hmac_secret: Secret<String>,
    /// If false, the deposit webhook will not check HMAC signatures. Only ever disable this in
    /// local development.
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_XPG_HOST.to_string(),
            port: DEFAULT_XPG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            fiat_currency: DEFAULT_FIAT_CURRENCY.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            offramp_config: OffRampConfig::default(),
            wallet_config: WalletConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("XPG_HOST").ok().unwrap_or_else(|| DEFAULT_XPG_HOST.into());
        let port = env::var("XPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for XPG_PORT. {e} Using the default, {DEFAULT_XPG_PORT}, instead."
                    );
                    DEFAULT_XPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_XPG_PORT);
        let database_url = env::var("XPG_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ XPG_DATABASE_URL is not set. Using the default, sqlite://data/xanpay_store.db");
            "sqlite://data/xanpay_store.db".to_string()
        });
        let fiat_currency = env::var("XPG_FIAT_CURRENCY").unwrap_or_else(|_| {
            info!("🪛️ XPG_FIAT_CURRENCY not set. Using {DEFAULT_FIAT_CURRENCY}.");
            DEFAULT_FIAT_CURRENCY.to_string()
        });
        let network = env::var("XPG_NETWORK").unwrap_or_else(|_| {
            info!("🪛️ XPG_NETWORK not set. Using {DEFAULT_NETWORK}.");
            DEFAULT_NETWORK.to_string()
        });
        Self {
            host,
            port,
            database_url,
            auth: AuthConfig::from_env_or_default(),
            webhook: WebhookConfig::from_env_or_default(),
            fiat_currency,
            network,
            offramp_config: OffRampConfig::new_from_env_or_default(),
            wallet_config: WalletConfig::new_from_env_or_default(),
        }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_signing_key = env::var("XPG_JWT_SIGNING_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!(
                "🪛️ XPG_JWT_SIGNING_KEY is not set. Generating a random signing key. Sessions will NOT survive a \
                 server restart."
            );
            Secret::new(random_key())
        });
        let token_validity = env::var("XPG_JWT_VALIDITY_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .map(Duration::hours)
            .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_VALIDITY_HOURS));
        Self { jwt_signing_key, token_validity }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = env::var("XPG_WEBHOOK_HMAC_SECRET").map(Secret::new).unwrap_or_else(|_| {
            warn!(
                "🪛️ XPG_WEBHOOK_HMAC_SECRET is not set. Generating a random secret. Incoming deposit webhooks will \
                 fail signature checks until this is configured."
            );
            Secret::new(random_key())
        });
        let hmac_checks = env::var("XPG_WEBHOOK_HMAC_CHECKS")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "none" | "0" | "off"))
            .unwrap_or(true);
        if !hmac_checks {
            warn!("🪛️ Webhook HMAC checks are DISABLED. Only do this in local development.");
        }
        Self { hmac_secret, hmac_checks }
    }
}

fn random_key() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
}

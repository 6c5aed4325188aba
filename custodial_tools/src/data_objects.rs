use serde::{Deserialize, Serialize};
use xpg_common::MicroUsdc;

/// Wallet provider responses wrap their payload in a `{message, statusCode, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEnvelope<T> {
    pub message: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    pub data: Option<T>,
}

/// A dedicated deposit address allocated under the master wallet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddress {
    /// Provider-side identifier for this address, used for balance queries and withdrawals.
    pub id: String,
    /// The raw on-chain address. Deposit webhooks are attributed by exact match on this.
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalance {
    /// Balance in whole-token decimal form, e.g. "125.5".
    pub balance: String,
}

impl AddressBalance {
    pub fn as_micro_usdc(&self) -> Option<MicroUsdc> {
        self.balance.parse::<MicroUsdc>().ok()
    }
}

/// An on-chain withdrawal from a managed address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWithdrawal {
    pub address: String,
    /// Whole-token decimal amount, e.g. "20".
    pub amount: String,
    pub asset_id: String,
    /// Client-chosen reference, echoed back in the provider's own webhooks.
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: String,
    pub hash: Option<String>,
    #[serde(default)]
    pub status: String,
}

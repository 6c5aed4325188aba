use serde::{Deserialize, Serialize};
use xpg_common::MicroUsdc;

/// Every off-ramp response wraps its payload in a `{status, message, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

/// A conversion rate quote for one token/fiat pair. The provider quotes fiat per whole token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub token: String,
    pub fiat: String,
    pub rate: f64,
}

impl ExchangeRate {
    /// Fiat value of the given token amount at this rate.
    pub fn convert(&self, amount: MicroUsdc) -> f64 {
        amount.to_units_f64() * self.rate
    }
}

/// The payout destination for an off-ramp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecipient {
    /// The provider's institution code for the recipient bank.
    pub institution: String,
    pub account_identifier: String,
    pub account_name: String,
    pub memo: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOfframpOrder {
    /// Token amount as a decimal string, e.g. "125.50".
    pub amount: String,
    pub token: String,
    pub network: String,
    pub rate: f64,
    pub recipient: OrderRecipient,
    /// Client-chosen idempotency reference. Doubles as the ledger transaction code.
    pub reference: String,
    /// Where the provider refunds the crypto leg if the fiat payout fails.
    pub return_address: String,
}

/// The order the provider created. `receive_address` is where the crypto leg must be sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfframpOrder {
    pub id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub network: String,
    pub receive_address: Option<String>,
    #[serde(default)]
    pub reference: String,
    pub valid_until: Option<String>,
}

//! Wire-format objects for the HTTP surface. Everything is camelCase JSON.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xanpay_engine::db_types::{Invoice, Merchant, Product};
use xpg_common::MicroUsdc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------  Onboarding  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub business_name: String,
    #[serde(default)]
    pub business_image: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub business_name: String,
    pub business_image: String,
    /// The merchant's custodial deposit address.
    pub user_address: String,
    /// Live USDC balance of the custodial address, in whole tokens.
    pub user_balance: f64,
}

impl BusinessProfile {
    pub fn from_merchant(merchant: &Merchant, balance: MicroUsdc) -> Self {
        Self {
            business_name: merchant.business_name.clone(),
            business_image: merchant.business_image.clone(),
            user_address: merchant.deposit_address.clone(),
            user_balance: balance.to_units_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub business: BusinessProfile,
}

//----------------------------------------------   Catalog  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductRequest {
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Unit price in whole tokens, e.g. 12.5.
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: Option<i64>,
}

fn default_currency() -> String {
    xpg_common::USDC_CURRENCY_CODE.to_string()
}

//----------------------------------------------   Invoices  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreatedResponse {
    pub invoice_code: String,
    pub valid_until: DateTime<Utc>,
}

/// The public invoice view returned by `GET /invoice/{code}`. This is what a buyer sees before
/// paying, so it carries the product and merchant display fields, never the merchant internals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInvoice {
    pub invoice_code: String,
    pub business_name: String,
    pub deposit_address: String,
    pub product_name: String,
    pub product_image: String,
    pub price: f64,
    pub quantity: i64,
    pub total: f64,
    pub currency: String,
    pub paid: bool,
    pub valid_until: DateTime<Utc>,
}

impl PublicInvoice {
    /// Returns `None` when the invoice total cannot be represented.
    pub fn assemble(invoice: &Invoice, product: &Product, merchant: &Merchant) -> Option<Self> {
        let total = product.price.checked_mul(invoice.quantity)?;
        Some(Self {
            invoice_code: invoice.code.clone(),
            business_name: merchant.business_name.clone(),
            deposit_address: merchant.deposit_address.clone(),
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            price: product.price.to_units_f64(),
            quantity: invoice.quantity,
            total: total.to_units_f64(),
            currency: product.currency.clone(),
            paid: invoice.paid,
            valid_until: invoice.valid_until,
        })
    }
}

//----------------------------------------------   Webhook  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DepositWebhookPayload {
    pub event: String,
    pub data: DepositEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositEvent {
    pub recipient_address: String,
    /// Whole-token decimal amount as the provider sends it, e.g. "20" or "12.5".
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawCryptoRequest {
    pub address: String,
    /// Whole-token amount.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawCryptoResponse {
    pub transaction_id: String,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawFiatRequest {
    /// Whole-token USDC amount to convert.
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawFiatResponse {
    pub transaction_id: String,
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub rate: f64,
}

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use xpg_common::MicroUsdc;

/// How long a freshly generated invoice may be settled before it passively expires.
pub const INVOICE_VALIDITY_DAYS: i64 = 7;

//--------------------------------------      Merchant      ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Merchant {
    pub id: i64,
    /// The subject identifier issued by the identity provider. This is the owner key for every
    /// other record in the system.
    pub subject_id: String,
    pub email: String,
    pub password_hash: String,
    pub business_name: String,
    pub business_image: String,
    /// The custodial deposit address allocated by the wallet-infrastructure provider at
    /// onboarding. Deposit webhooks are attributed to merchants by exact match on this field.
    pub deposit_address: String,
    /// The provider-side identifier for the custodial address. Required for withdrawals.
    pub provider_address_id: String,
    pub bank_institution: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    /// Returns the payout bank details iff all three fields have been registered.
    pub fn bank_details(&self) -> Option<BankDetails> {
        match (&self.bank_institution, &self.bank_account_number, &self.bank_account_name) {
            (Some(institution), Some(account_number), Some(account_name)) => Some(BankDetails {
                institution: institution.clone(),
                account_number: account_number.clone(),
                account_name: account_name.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMerchant {
    pub subject_id: String,
    pub email: String,
    pub password_hash: String,
    pub business_name: String,
    pub business_image: String,
    pub deposit_address: String,
    pub provider_address_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    /// The payment-rail partner's institution code for the merchant's bank.
    pub institution: String,
    pub account_number: String,
    pub account_name: String,
}

//--------------------------------------      Product       ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    #[serde(skip_serializing)]
    pub merchant_id: i64,
    pub name: String,
    pub image: String,
    pub price: MicroUsdc,
    pub currency: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub merchant_id: i64,
    pub name: String,
    pub image: String,
    pub price: MicroUsdc,
    pub currency: String,
    pub quantity: i64,
}

/// A partial update to a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<MicroUsdc>,
    pub currency: Option<String>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.quantity.is_none()
    }
}

//--------------------------------------      Invoice       ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    #[serde(skip_serializing)]
    pub merchant_id: i64,
    /// 8-character uppercase alphanumeric code, unique within the merchant's invoice collection.
    pub code: String,
    pub product_id: i64,
    pub quantity: i64,
    pub paid: bool,
    pub amount_paid: Option<MicroUsdc>,
    pub valid_until: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub merchant_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

impl NewInvoice {
    pub fn valid_until_from(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(INVOICE_VALIDITY_DAYS)
    }
}

//--------------------------------------   LedgerEntryType  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LedgerEntryType {
    /// An invoice settled against a product.
    Purchase,
    /// A deposit that could not be matched to an invoice (a plain top-up).
    Deposit,
    /// A direct on-chain withdrawal to an external address.
    Send,
    /// A fiat withdrawal through the off-ramp partner.
    Fiat,
}

impl Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryType::Purchase => write!(f, "Purchase"),
            LedgerEntryType::Deposit => write!(f, "Deposit"),
            LedgerEntryType::Send => write!(f, "Send"),
            LedgerEntryType::Fiat => write!(f, "Fiat"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid ledger entry type: {0}")]
pub struct LedgerEntryTypeConversionError(String);

impl FromStr for LedgerEntryType {
    type Err = LedgerEntryTypeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(Self::Purchase),
            "Deposit" => Ok(Self::Deposit),
            "Send" => Ok(Self::Send),
            "Fiat" => Ok(Self::Fiat),
            s => Err(LedgerEntryTypeConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    LedgerEntry     ----------------------------------------------------------
/// An immutable record of funds movement for a merchant. Rows are only ever inserted.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    #[serde(skip_serializing)]
    pub merchant_id: i64,
    /// 12-character uppercase code for purchases and withdrawals; `None` for plain deposits,
    /// which are identified by their row id alone.
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: LedgerEntryType,
    pub amount: MicroUsdc,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "hash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub merchant_id: i64,
    pub code: Option<String>,
    pub entry_type: LedgerEntryType,
    pub amount: MicroUsdc,
    pub currency: String,
    pub invoice_code: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub note: Option<String>,
    pub tx_hash: Option<String>,
    pub order_id: Option<String>,
    pub status: Option<String>,
}

impl NewLedgerEntry {
    /// A plain deposit entry that could not be matched to an invoice.
    pub fn deposit(merchant_id: i64, amount: MicroUsdc, currency: String, note: Option<String>, tx_hash: Option<String>) -> Self {
        Self {
            merchant_id,
            code: None,
            entry_type: LedgerEntryType::Deposit,
            amount,
            currency,
            invoice_code: None,
            product_name: None,
            quantity: None,
            note,
            tx_hash,
            order_id: None,
            status: None,
        }
    }

    /// A direct on-chain withdrawal entry.
    pub fn send(merchant_id: i64, code: String, amount: MicroUsdc, currency: String, tx_hash: Option<String>) -> Self {
        Self {
            merchant_id,
            code: Some(code),
            entry_type: LedgerEntryType::Send,
            amount,
            currency,
            invoice_code: None,
            product_name: None,
            quantity: None,
            note: None,
            tx_hash,
            order_id: None,
            status: None,
        }
    }

    /// A fiat withdrawal entry, written only after the on-chain leg has been accepted.
    pub fn fiat_initiated(merchant_id: i64, code: String, amount: MicroUsdc, currency: String, order_id: String) -> Self {
        Self {
            merchant_id,
            code: Some(code),
            entry_type: LedgerEntryType::Fiat,
            amount,
            currency,
            invoice_code: None,
            product_name: None,
            quantity: None,
            note: None,
            tx_hash: None,
            order_id: Some(order_id),
            status: Some("initiated".to_string()),
        }
    }
}

//--------------------------------------    Settlement      ----------------------------------------------------------
/// A request to apply a deposit to a specific invoice.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub merchant_id: i64,
    pub invoice_code: String,
    pub amount_paid: MicroUsdc,
    pub currency: String,
}

/// The outcome of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub invoice_code: String,
    pub amount_paid: MicroUsdc,
    pub total_amount: MicroUsdc,
    pub product_quantity_remaining: i64,
    pub transaction_id: String,
}

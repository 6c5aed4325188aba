use thiserror::Error;

use crate::db_types::{Invoice, LedgerEntry, Merchant, Product};

/// Read-side queries over the payment store.
///
/// Everything here is merchant-scoped except [`MerchantManagement::fetch_invoice_by_code_global`],
/// which backs the public invoice lookup endpoint and scans across merchants.
#[allow(async_fn_in_trait)]
pub trait MerchantManagement {
    async fn fetch_merchant_by_id(&self, merchant_id: i64) -> Result<Option<Merchant>, MerchantApiError>;

    async fn fetch_merchant_by_subject(&self, subject_id: &str) -> Result<Option<Merchant>, MerchantApiError>;

    async fn fetch_merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError>;

    /// Reverse lookup from a raw on-chain deposit address to its owning merchant. Used by the
    /// deposit webhook router to attribute inbound deposits.
    async fn fetch_merchant_by_deposit_address(&self, address: &str) -> Result<Option<Merchant>, MerchantApiError>;

    async fn fetch_products_for_merchant(&self, merchant_id: i64) -> Result<Vec<Product>, MerchantApiError>;

    async fn fetch_product(&self, merchant_id: i64, product_id: i64) -> Result<Option<Product>, MerchantApiError>;

    /// Fetches an invoice by its code within a single merchant's collection.
    async fn fetch_invoice(&self, merchant_id: i64, code: &str) -> Result<Option<Invoice>, MerchantApiError>;

    /// Fetches an invoice by code across all merchants. Invoice codes are only guaranteed unique
    /// per merchant; if two merchants happen to share a code, the oldest invoice wins.
    async fn fetch_invoice_by_code_global(&self, code: &str) -> Result<Option<Invoice>, MerchantApiError>;

    /// All ledger entries for a merchant, newest first.
    async fn fetch_ledger_for_merchant(&self, merchant_id: i64) -> Result<Vec<LedgerEntry>, MerchantApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum MerchantApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested merchant does not exist")]
    MerchantNotFound,
}

impl From<sqlx::Error> for MerchantApiError {
    fn from(e: sqlx::Error) -> Self {
        MerchantApiError::DatabaseError(e.to_string())
    }
}

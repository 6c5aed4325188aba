//! Unified API for merchant accounts, catalog and ledger queries.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{BankDetails, Invoice, LedgerEntry, Merchant, NewMerchant, NewProduct, Product, ProductUpdate},
    traits::{MerchantApiError, PaymentsDatabase, PaymentsDatabaseError},
};

pub struct MerchantApi<B> {
    db: B,
}

impl<B: Debug> Debug for MerchantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchantApi ({:?})", self.db)
    }
}

impl<B> MerchantApi<B>
where B: PaymentsDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new merchant. The custodial deposit address must already have been allocated
    /// from the wallet provider.
    pub async fn register_merchant(&self, merchant: NewMerchant) -> Result<Merchant, PaymentsDatabaseError> {
        let merchant = self.db.insert_merchant(merchant).await?;
        info!("🧾️ Merchant #{} ({}) registered with deposit address {}.", merchant.id, merchant.business_name, merchant.deposit_address);
        Ok(merchant)
    }

    pub async fn merchant_by_id(&self, merchant_id: i64) -> Result<Option<Merchant>, MerchantApiError> {
        self.db.fetch_merchant_by_id(merchant_id).await
    }

    pub async fn merchant_by_subject(&self, subject_id: &str) -> Result<Option<Merchant>, MerchantApiError> {
        self.db.fetch_merchant_by_subject(subject_id).await
    }

    pub async fn merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError> {
        self.db.fetch_merchant_by_email(email).await
    }

    pub async fn update_bank_details(&self, merchant_id: i64, details: BankDetails) -> Result<(), PaymentsDatabaseError> {
        self.db.update_bank_details(merchant_id, details).await?;
        info!("🧾️ Bank details updated for merchant #{merchant_id}.");
        Ok(())
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, PaymentsDatabaseError> {
        let product = self.db.insert_product(product).await?;
        info!("🧾️ Product #{} ({}) added for merchant #{}.", product.id, product.name, product.merchant_id);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        merchant_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, PaymentsDatabaseError> {
        self.db.update_product(merchant_id, product_id, update).await
    }

    pub async fn products_for_merchant(&self, merchant_id: i64) -> Result<Vec<Product>, MerchantApiError> {
        self.db.fetch_products_for_merchant(merchant_id).await
    }

    pub async fn product(&self, merchant_id: i64, product_id: i64) -> Result<Option<Product>, MerchantApiError> {
        self.db.fetch_product(merchant_id, product_id).await
    }

    /// Cross-merchant invoice lookup for the public invoice endpoint. Invoice codes are only
    /// unique per merchant, so the oldest match wins.
    pub async fn invoice_by_code(&self, code: &str) -> Result<Option<Invoice>, MerchantApiError> {
        self.db.fetch_invoice_by_code_global(code).await
    }

    /// All ledger entries for a merchant, newest first.
    pub async fn history_for_merchant(&self, merchant_id: i64) -> Result<Vec<LedgerEntry>, MerchantApiError> {
        self.db.fetch_ledger_for_merchant(merchant_id).await
    }
}

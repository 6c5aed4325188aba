//! `SqliteDatabase` is a concrete implementation of a XanPay payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module. The settlement flow is the one place that requires a multi-statement
//! transaction; everything else is a single conditional statement.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;
use xpg_common::{new_invoice_code, new_transaction_code};

use super::db::{invoices, ledger, merchants, new_pool, products};
use crate::{
    db_types::{
        BankDetails,
        Invoice,
        LedgerEntry,
        LedgerEntryType,
        Merchant,
        NewInvoice,
        NewLedgerEntry,
        NewMerchant,
        NewProduct,
        Product,
        ProductUpdate,
        SettlementRequest,
        SettlementResult,
    },
    traits::{MerchantApiError, MerchantManagement, PaymentsDatabase, PaymentsDatabaseError, SettlementError},
};

const MAX_INVOICE_CODE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool to the given URL and runs any pending migrations.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MerchantManagement for SqliteDatabase {
    async fn fetch_merchant_by_id(&self, merchant_id: i64) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(merchants::fetch_merchant_by_id(merchant_id, &mut conn).await?)
    }

    async fn fetch_merchant_by_subject(&self, subject_id: &str) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(merchants::fetch_merchant_by_subject(subject_id, &mut conn).await?)
    }

    async fn fetch_merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(merchants::fetch_merchant_by_email(email, &mut conn).await?)
    }

    async fn fetch_merchant_by_deposit_address(&self, address: &str) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(merchants::fetch_merchant_by_deposit_address(address, &mut conn).await?)
    }

    async fn fetch_products_for_merchant(&self, merchant_id: i64) -> Result<Vec<Product>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_products_for_merchant(merchant_id, &mut conn).await?)
    }

    async fn fetch_product(&self, merchant_id: i64, product_id: i64) -> Result<Option<Product>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(merchant_id, product_id, &mut conn).await?)
    }

    async fn fetch_invoice(&self, merchant_id: i64, code: &str) -> Result<Option<Invoice>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(invoices::fetch_invoice(merchant_id, code, &mut conn).await?)
    }

    async fn fetch_invoice_by_code_global(&self, code: &str) -> Result<Option<Invoice>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(invoices::fetch_invoice_by_code_global(code, &mut conn).await?)
    }

    async fn fetch_ledger_for_merchant(&self, merchant_id: i64) -> Result<Vec<LedgerEntry>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::fetch_entries_for_merchant(merchant_id, &mut conn).await?)
    }
}

impl PaymentsDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_merchant(&self, merchant: NewMerchant) -> Result<Merchant, PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        merchants::insert_merchant(merchant, &mut conn).await
    }

    async fn update_bank_details(&self, merchant_id: i64, details: BankDetails) -> Result<(), PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        merchants::update_bank_details(merchant_id, details, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn update_product(
        &self,
        merchant_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        products::update_product(merchant_id, product_id, update, &mut conn).await
    }

    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(invoice.merchant_id, invoice.product_id, &mut conn)
            .await?
            .ok_or(PaymentsDatabaseError::ProductNotFound)?;
        if product.quantity < invoice.quantity {
            return Err(PaymentsDatabaseError::InsufficientStockForInvoice {
                requested: invoice.quantity,
                on_hand: product.quantity,
            });
        }
        let valid_until = NewInvoice::valid_until_from(Utc::now());
        // Codes are short, so collisions are possible. Regenerate and retry a few times.
        for _ in 0..MAX_INVOICE_CODE_ATTEMPTS {
            let code = new_invoice_code();
            if let Some(created) = invoices::try_insert_invoice(
                invoice.merchant_id,
                &code,
                invoice.product_id,
                invoice.quantity,
                valid_until,
                &mut conn,
            )
            .await?
            {
                return Ok(created);
            }
            warn!("🗃️ Invoice code collision for merchant #{}. Regenerating.", invoice.merchant_id);
        }
        Err(PaymentsDatabaseError::InvoiceCodeExhausted(MAX_INVOICE_CODE_ATTEMPTS))
    }

    /// The settlement state machine. The ordered checks, the inventory decrement, the paid-flip
    /// and the Purchase ledger append all run inside one transaction: a crash or a failed check
    /// between any two steps rolls the whole attempt back, so inventory can never be decremented
    /// against an unpaid invoice (or vice versa).
    async fn settle_invoice(&self, request: SettlementRequest) -> Result<SettlementResult, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let invoice = invoices::fetch_invoice(request.merchant_id, &request.invoice_code, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::InvoiceNotFound(request.invoice_code.clone()))?;
        if invoice.paid {
            return Err(SettlementError::AlreadyPaid(invoice.code));
        }
        if invoice.is_expired_at(Utc::now()) {
            return Err(SettlementError::Expired(invoice.code));
        }
        let product = products::fetch_product(request.merchant_id, invoice.product_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::ProductNotFound(invoice.code.clone()))?;
        let total_amount = product
            .price
            .checked_mul(invoice.quantity)
            .ok_or_else(|| SettlementError::AmountOverflow(invoice.code.clone()))?;
        if request.amount_paid < total_amount {
            return Err(SettlementError::InsufficientPayment {
                required: total_amount,
                received: request.amount_paid,
            });
        }
        let remaining = products::decrement_quantity(product.id, invoice.quantity, &mut tx).await?.ok_or(
            SettlementError::InsufficientStock { requested: invoice.quantity, on_hand: product.quantity },
        )?;
        // The conditional flip is the serialisation point for concurrent deliveries of the same
        // deposit webhook: only one settlement attempt can observe paid = 0.
        if !invoices::mark_paid(invoice.id, request.amount_paid, Utc::now(), &mut tx).await? {
            return Err(SettlementError::AlreadyPaid(invoice.code));
        }
        let entry = NewLedgerEntry {
            merchant_id: request.merchant_id,
            code: Some(new_transaction_code()),
            entry_type: LedgerEntryType::Purchase,
            amount: request.amount_paid,
            currency: request.currency.clone(),
            invoice_code: Some(invoice.code.clone()),
            product_name: Some(product.name.clone()),
            quantity: Some(invoice.quantity),
            note: None,
            tx_hash: None,
            order_id: None,
            status: None,
        };
        let entry = ledger::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Invoice [{}] settled for {}. {} units of [{}] remain.",
            invoice.code, request.amount_paid, remaining, product.name
        );
        Ok(SettlementResult {
            invoice_code: invoice.code,
            amount_paid: request.amount_paid,
            total_amount,
            product_quantity_remaining: remaining,
            transaction_id: entry.code.unwrap_or_default(),
        })
    }

    async fn insert_ledger_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::insert_entry(entry, &mut conn).await?)
    }

    async fn record_offramp_order(
        &self,
        merchant_id: i64,
        reference: &str,
        order_id: &str,
        response_body: &str,
    ) -> Result<(), PaymentsDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::record_offramp_order(merchant_id, reference, order_id, response_body, &mut conn).await?)
    }

    async fn close(&mut self) -> Result<(), PaymentsDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

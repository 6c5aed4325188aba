use thiserror::Error;
use xpg_common::MicroUsdc;

use crate::{
    db_types::{
        BankDetails,
        Invoice,
        LedgerEntry,
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
    traits::{MerchantApiError, MerchantManagement},
};

/// The mutating flows a backend must support to drive the payment gateway.
///
/// Backends must provide at least single-row conditional-update semantics; [`settle_invoice`]
/// additionally requires a multi-row transaction so that the inventory decrement, the invoice
/// paid-flip and the ledger append land together or not at all.
///
/// [`settle_invoice`]: PaymentsDatabase::settle_invoice
#[allow(async_fn_in_trait)]
pub trait PaymentsDatabase: Clone + MerchantManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a new merchant record. The custodial deposit address has already been allocated
    /// from the wallet provider by the caller.
    async fn insert_merchant(&self, merchant: NewMerchant) -> Result<Merchant, PaymentsDatabaseError>;

    /// Replaces the merchant's payout bank details.
    async fn update_bank_details(&self, merchant_id: i64, details: BankDetails) -> Result<(), PaymentsDatabaseError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentsDatabaseError>;

    /// Applies a partial update to a product owned by the given merchant.
    async fn update_product(
        &self,
        merchant_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, PaymentsDatabaseError>;

    /// Creates a new invoice with a freshly generated 8-character code. The referenced product
    /// must belong to the same merchant and have at least `quantity` units on hand at creation
    /// time (stock is only committed at settlement).
    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, PaymentsDatabaseError>;

    /// Applies a deposit to an invoice: the ordered validation checks, the conditional inventory
    /// decrement, the paid-flip and the Purchase ledger append, all inside one transaction.
    ///
    /// Concurrent settlement attempts for the same invoice are serialised by the conditional
    /// paid-flip (`... WHERE paid = 0`): exactly one attempt can win, all others observe
    /// [`SettlementError::AlreadyPaid`]. Any failure rolls back every staged write.
    async fn settle_invoice(&self, request: SettlementRequest) -> Result<SettlementResult, SettlementError>;

    /// Appends a non-purchase ledger entry (Deposit, Send or Fiat). Purchase entries are only
    /// ever written by [`settle_invoice`](PaymentsDatabase::settle_invoice).
    async fn insert_ledger_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, PaymentsDatabaseError>;

    /// Persists the raw off-ramp order response as an audit record. This happens before the
    /// on-chain leg of a fiat withdrawal, so a failed withdrawal still leaves the order visible.
    async fn record_offramp_order(
        &self,
        merchant_id: i64,
        reference: &str,
        order_id: &str,
        response_body: &str,
    ) -> Result<(), PaymentsDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentsDatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentsDatabaseError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("A merchant is already registered with this email address")]
    EmailAlreadyRegistered,
    #[error("A merchant is already registered with this deposit address")]
    DepositAddressAlreadyRegistered,
    #[error("The requested merchant does not exist")]
    MerchantNotFound,
    #[error("The requested product does not exist")]
    ProductNotFound,
    #[error("Not enough stock to create the invoice: requested {requested}, on hand {on_hand}")]
    InsufficientStockForInvoice { requested: i64, on_hand: i64 },
    #[error("Could not generate a unique invoice code after {0} attempts")]
    InvoiceCodeExhausted(u32),
    #[error("The product update contained no fields to change")]
    ProductUpdateNoOp,
    #[error("{0}")]
    MerchantApiError(#[from] MerchantApiError),
}

impl From<sqlx::Error> for PaymentsDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        PaymentsDatabaseError::DatabaseError(e.to_string())
    }
}

/// The settlement failure taxonomy. First failing check wins; every variant leaves the store
/// exactly as it was before the attempt.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("No invoice with code {0} exists for this merchant")]
    InvoiceNotFound(String),
    #[error("Invoice {0} has already been paid")]
    AlreadyPaid(String),
    #[error("Invoice {0} expired and can no longer be settled")]
    Expired(String),
    #[error("The product referenced by invoice {0} no longer exists")]
    ProductNotFound(String),
    #[error("The total for invoice {0} overflows the representable amount")]
    AmountOverflow(String),
    #[error("Insufficient payment: required {required}, received {received}")]
    InsufficientPayment { required: MicroUsdc, received: MicroUsdc },
    #[error("Insufficient stock: invoice requires {requested}, only {on_hand} on hand")]
    InsufficientStock { requested: i64, on_hand: i64 },
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

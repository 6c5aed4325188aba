use custodial_tools::{CustodialWallet, DepositAddress, WalletApiError, WalletTransaction};
use mockall::mock;
use offramp_tools::{ExchangeRate, NewOfframpOrder, OffRamp, OffRampApiError, OfframpOrder};
use xanpay_engine::{
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
    traits::{MerchantApiError, MerchantManagement, PaymentsDatabase, PaymentsDatabaseError, SettlementError},
};
use xpg_common::MicroUsdc;

mock! {
    pub PaymentsDb {}
    impl Clone for PaymentsDb {
        fn clone(&self) -> Self;
    }
    impl MerchantManagement for PaymentsDb {
        async fn fetch_merchant_by_id(&self, merchant_id: i64) -> Result<Option<Merchant>, MerchantApiError>;
        async fn fetch_merchant_by_subject(&self, subject_id: &str) -> Result<Option<Merchant>, MerchantApiError>;
        async fn fetch_merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError>;
        async fn fetch_merchant_by_deposit_address(&self, address: &str) -> Result<Option<Merchant>, MerchantApiError>;
        async fn fetch_products_for_merchant(&self, merchant_id: i64) -> Result<Vec<Product>, MerchantApiError>;
        async fn fetch_product(&self, merchant_id: i64, product_id: i64) -> Result<Option<Product>, MerchantApiError>;
        async fn fetch_invoice(&self, merchant_id: i64, code: &str) -> Result<Option<Invoice>, MerchantApiError>;
        async fn fetch_invoice_by_code_global(&self, code: &str) -> Result<Option<Invoice>, MerchantApiError>;
        async fn fetch_ledger_for_merchant(&self, merchant_id: i64) -> Result<Vec<LedgerEntry>, MerchantApiError>;
    }
    impl PaymentsDatabase for PaymentsDb {
        fn url(&self) -> &str;
        async fn insert_merchant(&self, merchant: NewMerchant) -> Result<Merchant, PaymentsDatabaseError>;
        async fn update_bank_details(&self, merchant_id: i64, details: BankDetails) -> Result<(), PaymentsDatabaseError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentsDatabaseError>;
        async fn update_product(&self, merchant_id: i64, product_id: i64, update: ProductUpdate) -> Result<Product, PaymentsDatabaseError>;
        async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, PaymentsDatabaseError>;
        async fn settle_invoice(&self, request: SettlementRequest) -> Result<SettlementResult, SettlementError>;
        async fn insert_ledger_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, PaymentsDatabaseError>;
        async fn record_offramp_order(&self, merchant_id: i64, reference: &str, order_id: &str, response_body: &str) -> Result<(), PaymentsDatabaseError>;
        async fn close(&mut self) -> Result<(), PaymentsDatabaseError>;
    }
}

mock! {
    pub OffRampClient {}
    impl Clone for OffRampClient {
        fn clone(&self) -> Self;
    }
    impl OffRamp for OffRampClient {
        async fn fetch_rate(&self, token: &str, amount: MicroUsdc, fiat: &str) -> Result<ExchangeRate, OffRampApiError>;
        async fn create_order(&self, order: NewOfframpOrder) -> Result<OfframpOrder, OffRampApiError>;
    }
}

mock! {
    pub Wallet {}
    impl Clone for Wallet {
        fn clone(&self) -> Self;
    }
    impl CustodialWallet for Wallet {
        async fn create_address(&self, label: &str) -> Result<DepositAddress, WalletApiError>;
        async fn fetch_balance(&self, address_id: &str) -> Result<MicroUsdc, WalletApiError>;
        async fn withdraw(&self, address_id: &str, to: &str, amount: MicroUsdc, reference: &str) -> Result<WalletTransaction, WalletApiError>;
    }
}

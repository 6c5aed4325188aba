use xanpay_engine::{
    db_types::{Merchant, NewMerchant, NewProduct, Product},
    traits::PaymentsDatabase,
    SqliteDatabase,
};
use xpg_common::{MicroUsdc, USDC_CURRENCY_CODE};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh in-memory database per test. A single connection keeps the shared in-memory store
/// alive for the lifetime of the pool.
pub async fn new_test_db() -> SqliteDatabase {
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating test database")
}

pub async fn seed_merchant(db: &SqliteDatabase, tag: &str) -> Merchant {
    let merchant = NewMerchant {
        subject_id: format!("subject-{tag}"),
        email: format!("{tag}@example.com"),
        password_hash: "salt$deadbeef".to_string(),
        business_name: format!("Business {tag}"),
        business_image: "https://img.example.com/logo.png".to_string(),
        deposit_address: format!("0xdeposit{tag}"),
        provider_address_id: format!("addr-{tag}"),
    };
    db.insert_merchant(merchant).await.expect("Error seeding merchant")
}

pub async fn seed_product(db: &SqliteDatabase, merchant_id: i64, price_units: i64, quantity: i64) -> Product {
    let product = NewProduct {
        merchant_id,
        name: "Coffee Beans".to_string(),
        image: "https://img.example.com/beans.png".to_string(),
        price: MicroUsdc::from_units(price_units),
        currency: USDC_CURRENCY_CODE.to_string(),
        quantity,
    };
    db.insert_product(product).await.expect("Error seeding product")
}

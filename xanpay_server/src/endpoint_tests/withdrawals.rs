//! Withdrawal endpoint tests. The interesting cases are the partial-failure ones: which provider
//! calls happen, and which rows are written, when a leg of the flow fails.

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use custodial_tools::{WalletApiError, WalletTransaction};
use offramp_tools::{ExchangeRate, OffRampApiError, OfframpOrder};
use xanpay_engine::db_types::{LedgerEntryType, Merchant};
use xpg_common::MicroUsdc;

use super::helpers::{
    error_json,
    issue_token,
    ledger_entry,
    post_request,
    seed_merchant,
    seed_merchant_with_bank,
    SUBJECT,
};
use crate::{
    endpoint_tests::mocks::{MockOffRampClient, MockPaymentsDb, MockWallet},
    routes::{WithdrawCryptoRoute, WithdrawFiatRoute},
    withdrawal::WithdrawalApi,
};

fn rate() -> ExchangeRate {
    ExchangeRate { token: "USDC".to_string(), fiat: "NGN".to_string(), rate: 1500.0 }
}

fn order() -> OfframpOrder {
    OfframpOrder {
        id: "ord-123".to_string(),
        amount: "20".to_string(),
        token: "USDC".to_string(),
        network: "base".to_string(),
        receive_address: Some("0xrecv00aa11bb22cc33dd44ee55ff66aa77bb88cc".to_string()),
        reference: "TX0000000001".to_string(),
        valid_until: None,
    }
}

fn wallet_tx() -> WalletTransaction {
    WalletTransaction { id: "wtx-9".to_string(), hash: Some("0xhash".to_string()), status: "pending".to_string() }
}

fn install(cfg: &mut ServiceConfig, db: MockPaymentsDb, offramp: MockOffRampClient, wallet: MockWallet) {
    let api = WithdrawalApi::new(db, offramp, wallet, "NGN".to_string(), "base".to_string());
    cfg.service(WithdrawFiatRoute::<MockPaymentsDb, MockOffRampClient, MockWallet>::new())
        .service(WithdrawCryptoRoute::<MockPaymentsDb, MockOffRampClient, MockWallet>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn a_fiat_withdrawal_composes_rate_order_and_payout() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) = post_request(&token, "/withdrawFiat", body, fiat_happy_path).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"orderId\":\"ord-123\""), "got {body}");
    assert!(body.contains("\"rate\":1500.0"), "got {body}");
    assert!(body.contains("\"currency\":\"NGN\""), "got {body}");
}

fn fiat_happy_path(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant_with_bank())));
    db.expect_record_offramp_order().times(1).returning(|_, _, _, _| Ok(()));
    db.expect_insert_ledger_entry()
        .times(1)
        .returning(|_| Ok(ledger_entry(LedgerEntryType::Fiat, MicroUsdc::from_units(20))));
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().times(1).returning(|_, _, _| Ok(rate()));
    offramp.expect_create_order().times(1).returning(|_| Ok(order()));
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(1).returning(|_, _, _, _| Ok(wallet_tx()));
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn a_failed_rate_quote_creates_no_order_and_no_ledger_entry() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) = post_request(&token, "/withdrawFiat", body, fiat_rate_failure).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, error_json("An upstream provider is unavailable"));
}

fn fiat_rate_failure(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant_with_bank())));
    db.expect_record_offramp_order().times(0);
    db.expect_insert_ledger_entry().times(0);
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().returning(|_, _, _| Err(OffRampApiError::NetworkError("timeout".to_string())));
    offramp.expect_create_order().times(0);
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(0);
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn a_failed_payout_still_leaves_the_order_audit_row() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) = post_request(&token, "/withdrawFiat", body, fiat_wallet_failure).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, error_json("An upstream provider is unavailable"));
}

fn fiat_wallet_failure(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant_with_bank())));
    // The order is persisted before the on-chain leg, so it must be recorded even when the
    // payout fails. No ledger entry may be written.
    db.expect_record_offramp_order().times(1).returning(|_, _, _, _| Ok(()));
    db.expect_insert_ledger_entry().times(0);
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().returning(|_, _, _| Ok(rate()));
    offramp.expect_create_order().returning(|_| Ok(order()));
    let mut wallet = MockWallet::new();
    wallet
        .expect_withdraw()
        .times(1)
        .returning(|_, _, _, _| Err(WalletApiError::QueryError { status: 500, message: "boom".to_string() }));
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn an_order_without_a_receive_address_moves_no_funds() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) =
        post_request(&token, "/withdrawFiat", body, fiat_order_missing_receive_address).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, error_json("An upstream provider is unavailable"));
}

fn fiat_order_missing_receive_address(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant_with_bank())));
    // An order with no receive address aborts before the audit row, the payout and the ledger.
    db.expect_record_offramp_order().times(0);
    db.expect_insert_ledger_entry().times(0);
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().returning(|_, _, _| Ok(rate()));
    offramp.expect_create_order().times(1).returning(|_| Ok(OfframpOrder { receive_address: None, ..order() }));
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(0);
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn fiat_withdrawal_without_a_provider_address_is_rejected_up_front() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) =
        post_request(&token, "/withdrawFiat", body, fiat_no_provider_address).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_json("The withdrawal cannot proceed. The merchant has no provider-side wallet address"));
}

fn fiat_no_provider_address(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject()
        .returning(|_| Ok(Some(Merchant { provider_address_id: "".to_string(), ..seed_merchant_with_bank() })));
    db.expect_record_offramp_order().times(0);
    db.expect_insert_ledger_entry().times(0);
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().times(0);
    offramp.expect_create_order().times(0);
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(0);
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn fiat_withdrawal_without_bank_details_is_rejected_before_any_provider_call() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"amount": 20.0});
    let (status, body) = post_request(&token, "/withdrawFiat", body, fiat_no_bank_details).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_json("The withdrawal cannot proceed. Bank details must be registered before withdrawing fiat"));
}

fn fiat_no_bank_details(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant())));
    let mut offramp = MockOffRampClient::new();
    offramp.expect_fetch_rate().times(0);
    offramp.expect_create_order().times(0);
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(0);
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn a_crypto_withdrawal_pays_out_and_records_a_send_entry() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"address": "0x1234567890abcdef1234567890abcdef12345678", "amount": 5.0});
    let (status, body) = post_request(&token, "/withdrawCrypto", body, crypto_happy_path).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"hash\":\"0xhash\""), "got {body}");
}

fn crypto_happy_path(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant())));
    db.expect_insert_ledger_entry()
        .times(1)
        .returning(|_| Ok(ledger_entry(LedgerEntryType::Send, MicroUsdc::from_units(5))));
    let offramp = MockOffRampClient::new();
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(1).returning(|_, _, _, _| Ok(wallet_tx()));
    install(cfg, db, offramp, wallet);
}

#[actix_web::test]
async fn a_crypto_withdrawal_with_a_non_positive_amount_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"address": "0x1234567890abcdef1234567890abcdef12345678", "amount": 0.0});
    let (status, body) = post_request(&token, "/withdrawCrypto", body, crypto_never_reached).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_json("Invalid request. amount must be positive"));
}

fn crypto_never_reached(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().times(0);
    db.expect_insert_ledger_entry().times(0);
    let offramp = MockOffRampClient::new();
    let mut wallet = MockWallet::new();
    wallet.expect_withdraw().times(0);
    install(cfg, db, offramp, wallet);
}

//! Deposit webhook tests: HMAC verification plus the routing outcomes behind it.

use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use xanpay_engine::{
    db_types::{LedgerEntryType, SettlementResult},
    traits::SettlementError,
    SettlementApi,
};
use xpg_common::{MicroUsdc, Secret};

use super::helpers::{ledger_entry, open_invoice, seed_merchant, DEPOSIT_ADDRESS};
use crate::{
    endpoint_tests::mocks::MockPaymentsDb,
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    routes::DepositWebhookRoute,
};

const WEBHOOK_SECRET: &str = "webhook-test-secret-do-not-reuse";

fn settled_result() -> SettlementResult {
    SettlementResult {
        invoice_code: "AB12CD34".to_string(),
        amount_paid: MicroUsdc::from_units(20),
        total_amount: MicroUsdc::from_units(20),
        product_quantity_remaining: 8,
        transaction_id: "TX0000000001".to_string(),
    }
}

fn deposit_body(note: Option<&str>) -> String {
    let note = note.map(|n| format!(", \"note\": \"{n}\"")).unwrap_or_default();
    format!(
        "{{\"event\": \"deposit.success\", \"data\": {{\"recipientAddress\": \"{DEPOSIT_ADDRESS}\", \"amount\": \
         \"20\", \"hash\": \"0xfeed\"{note}}}}}"
    )
}

async fn call_webhook(db: MockPaymentsDb, body: &str, signature: Option<String>) -> Result<(StatusCode, String), String> {
    let _ = env_logger::try_init().ok();
    let app = App::new().app_data(web::Data::new(SettlementApi::new(db))).service(
        web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new("X-Webhook-Signature", Secret::new(WEBHOOK_SECRET.to_string()), true))
            .service(DepositWebhookRoute::<MockPaymentsDb>::new()),
    );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post()
        .uri("/webhook/deposit")
        .insert_header(ContentType::json())
        .set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header(("X-Webhook-Signature", sig));
    }
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

fn sign(body: &str) -> Option<String> {
    Some(calculate_hmac(WEBHOOK_SECRET, body.as_bytes()))
}

#[actix_web::test]
async fn a_signed_deposit_with_a_matching_note_settles_the_invoice() {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_deposit_address().returning(|_| Ok(Some(seed_merchant())));
    db.expect_fetch_invoice().returning(|_, code| Ok((code == "AB12CD34").then(|| open_invoice("AB12CD34"))));
    db.expect_settle_invoice().times(1).returning(|_| Ok(settled_result()));
    db.expect_insert_ledger_entry().times(0);
    let body = deposit_body(Some("AB12CD34"));
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("invoice AB12CD34 settled"), "got {res}");
}

#[actix_web::test]
async fn a_deposit_without_a_note_is_credited_as_a_top_up() {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_deposit_address().returning(|_| Ok(Some(seed_merchant())));
    db.expect_fetch_invoice().times(0);
    db.expect_settle_invoice().times(0);
    db.expect_insert_ledger_entry()
        .times(1)
        .returning(|_| Ok(ledger_entry(LedgerEntryType::Deposit, MicroUsdc::from_units(20))));
    let body = deposit_body(None);
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("deposit credited"), "got {res}");
}

#[actix_web::test]
async fn a_replayed_deposit_for_a_paid_invoice_writes_nothing() {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_deposit_address().returning(|_| Ok(Some(seed_merchant())));
    db.expect_fetch_invoice().returning(|_, _| Ok(Some(open_invoice("AB12CD34"))));
    db.expect_settle_invoice().times(1).returning(|_| Err(SettlementError::AlreadyPaid("AB12CD34".to_string())));
    // The failed settlement must not fall back to a plain deposit credit
    db.expect_insert_ledger_entry().times(0);
    let body = deposit_body(Some("AB12CD34"));
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("settlement failed"), "got {res}");
}

#[actix_web::test]
async fn a_deposit_to_an_unknown_address_is_acknowledged_but_unattributed() {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_deposit_address().returning(|_| Ok(None));
    db.expect_insert_ledger_entry().times(0);
    let body = deposit_body(Some("AB12CD34"));
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("unattributable"), "got {res}");
}

#[actix_web::test]
async fn non_deposit_events_are_ignored() {
    let db = MockPaymentsDb::new();
    let body = format!(
        "{{\"event\": \"deposit.failed\", \"data\": {{\"recipientAddress\": \"{DEPOSIT_ADDRESS}\", \"amount\": \"20\"}}}}"
    );
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("ignored"), "got {res}");
}

#[actix_web::test]
async fn an_unparseable_amount_is_acknowledged_without_touching_the_store() {
    let db = MockPaymentsDb::new();
    let body = format!(
        "{{\"event\": \"deposit.success\", \"data\": {{\"recipientAddress\": \"{DEPOSIT_ADDRESS}\", \"amount\": \
         \"twenty\"}}}}"
    );
    let (status, res) = call_webhook(db, &body, sign(&body)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("unparseable amount"), "got {res}");
}

#[actix_web::test]
async fn a_missing_signature_is_forbidden() {
    let db = MockPaymentsDb::new();
    let body = deposit_body(Some("AB12CD34"));
    let err = call_webhook(db, &body, None).await.expect_err("Expected error");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn a_wrong_signature_is_forbidden() {
    let db = MockPaymentsDb::new();
    let body = deposit_body(Some("AB12CD34"));
    let err = call_webhook(db, &body, Some(calculate_hmac("some-other-secret", body.as_bytes())))
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn the_signature_covers_the_exact_body_bytes() {
    let db = MockPaymentsDb::new();
    let body = deposit_body(Some("AB12CD34"));
    let tampered = body.replace("\"20\"", "\"2000\"");
    let err = call_webhook(db, &tampered, sign(&body)).await.expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Days, Utc};
use xanpay_engine::{db_types::Invoice, MerchantApi, SettlementApi};
use xpg_common::MicroUsdc;

use super::helpers::{
    error_json,
    get_request,
    issue_token,
    open_invoice,
    post_request,
    seed_merchant,
    seed_product,
    SUBJECT,
};
use crate::{
    endpoint_tests::mocks::MockPaymentsDb,
    routes::{CreateInvoiceRoute, InvoiceRoute, ProductsRoute, UpdateBankDetailsRoute},
};

#[actix_web::test]
async fn products_lists_the_merchants_catalog() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let (status, body) = get_request(&token, "/products", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"name\":\"Coffee Beans\""), "got {body}");
    assert!(body.contains("\"quantity\":10"), "got {body}");
}

#[actix_web::test]
async fn create_invoice_returns_the_code_and_expiry() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"productId": 5, "quantity": 2});
    let (status, body) = post_request(&token, "/createInvoice", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"invoiceCode\":\"AB12CD34\""), "got {body}");
    assert!(body.contains("\"validUntil\":"), "got {body}");
}

#[actix_web::test]
async fn create_invoice_rejects_a_non_positive_quantity() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"productId": 5, "quantity": 0});
    let (status, body) = post_request(&token, "/createInvoice", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_json("Invalid request. quantity must be positive"));
}

#[actix_web::test]
async fn public_invoice_lookup_needs_no_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/invoice/AB12CD34", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"invoiceCode\":\"AB12CD34\""), "got {body}");
    assert!(body.contains("\"businessName\":\"Mocha Labs\""), "got {body}");
    assert!(body.contains("\"productName\":\"Coffee Beans\""), "got {body}");
    assert!(body.contains("\"total\":20.0"), "got {body}");
    // Merchant internals must not leak through the public view
    assert!(!body.contains("passwordHash"), "got {body}");
    assert!(!body.contains("email"), "got {body}");
}

#[actix_web::test]
async fn public_invoice_lookup_is_case_insensitive() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/invoice/ab12cd34", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn unknown_invoice_code_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/invoice/ZZ99ZZ99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_json("The data was not found. Invoice ZZ99ZZ99"));
}

#[actix_web::test]
async fn a_paid_invoice_is_gone_from_the_public_view() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/invoice/AA11AA11", configure_closed_invoices).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_json("The data was not found. Invoice AA11AA11"));
}

#[actix_web::test]
async fn an_expired_invoice_is_gone_from_the_public_view() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/invoice/BB22BB22", configure_closed_invoices).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_json("The data was not found. Invoice BB22BB22"));
}

#[actix_web::test]
async fn an_unrepresentable_invoice_total_is_a_backend_error() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/invoice/CC33CC33", configure_overflow_invoice).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        error_json(
            "An error occurred on the backend of the server. Invoice CC33CC33 total overflows the representable amount"
        )
    );
}

#[actix_web::test]
async fn bank_details_with_a_blank_field_are_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body = serde_json::json!({"institution": "First Unity Bank", "accountNumber": "", "accountName": "Mocha Labs Ltd"});
    let (status, body) = post_request(&token, "/updateBankDetails", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_json("Invalid request. All bank detail fields are required"));
}

#[actix_web::test]
async fn bank_details_are_stored() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(SUBJECT);
    let body =
        serde_json::json!({"institution": "First Unity Bank", "accountNumber": "0123456789", "accountName": "Mocha Labs Ltd"});
    let (status, body) = post_request(&token, "/updateBankDetails", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Bank details updated"), "got {body}");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_merchant_by_subject().returning(|_| Ok(Some(seed_merchant())));
    db.expect_fetch_merchant_by_id().returning(|id| Ok((id == 1).then_some(seed_merchant())));
    db.expect_fetch_products_for_merchant().returning(|_| Ok(vec![seed_product()]));
    db.expect_fetch_product().returning(|_, product_id| Ok((product_id == 5).then_some(seed_product())));
    db.expect_fetch_invoice_by_code_global()
        .returning(|code| Ok((code == "AB12CD34").then(|| open_invoice("AB12CD34"))));
    db.expect_insert_invoice().returning(|_| Ok(open_invoice("AB12CD34")));
    db.expect_update_bank_details().returning(|_, _| Ok(()));
    let mut settlement_db = MockPaymentsDb::new();
    settlement_db.expect_insert_invoice().returning(|_| Ok(open_invoice("AB12CD34")));
    cfg.service(ProductsRoute::<MockPaymentsDb>::new())
        .service(CreateInvoiceRoute::<MockPaymentsDb>::new())
        .service(InvoiceRoute::<MockPaymentsDb>::new())
        .service(UpdateBankDetailsRoute::<MockPaymentsDb>::new())
        .app_data(web::Data::new(MerchantApi::new(db)))
        .app_data(web::Data::new(SettlementApi::new(settlement_db)));
}

fn configure_closed_invoices(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_invoice_by_code_global().returning(|code| {
        Ok(match code {
            "AA11AA11" => {
                Some(Invoice { paid: true, amount_paid: Some(MicroUsdc::from_units(20)), ..open_invoice("AA11AA11") })
            },
            "BB22BB22" => Some(Invoice { valid_until: Utc::now() - Days::new(1), ..open_invoice("BB22BB22") }),
            _ => None,
        })
    });
    // A closed invoice must be refused before the merchant or product is consulted.
    db.expect_fetch_merchant_by_id().times(0);
    db.expect_fetch_product().times(0);
    cfg.service(InvoiceRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(MerchantApi::new(db)));
}

fn configure_overflow_invoice(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_invoice_by_code_global()
        .returning(|_| Ok(Some(Invoice { quantity: i64::MAX / 2, ..open_invoice("CC33CC33") })));
    db.expect_fetch_merchant_by_id().returning(|_| Ok(Some(seed_merchant())));
    db.expect_fetch_product().returning(|_, _| Ok(Some(seed_product())));
    cfg.service(InvoiceRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(MerchantApi::new(db)));
}

use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;
use xpg_common::MicroUsdc;

use crate::db_types::Invoice;

/// Inserts an invoice with the given (already generated) code. Returns `None` if the code
/// collides with an existing invoice for the same merchant, in which case the caller should
/// regenerate and retry.
pub async fn try_insert_invoice(
    merchant_id: i64,
    code: &str,
    product_id: i64,
    quantity: i64,
    valid_until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let result = sqlx::query_as::<_, Invoice>(
        r#"
            INSERT INTO invoices (merchant_id, code, product_id, quantity, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(merchant_id)
    .bind(code)
    .bind(product_id)
    .bind(quantity)
    .bind(valid_until)
    .fetch_one(conn)
    .await;
    match result {
        Ok(invoice) => {
            debug!("🗃️ Invoice [{}] created for merchant #{merchant_id}", invoice.code);
            Ok(Some(invoice))
        },
        Err(sqlx::Error::Database(db)) if db.message().contains("UNIQUE") => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn fetch_invoice(
    merchant_id: i64,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM invoices WHERE merchant_id = $1 AND code = $2")
        .bind(merchant_id)
        .bind(code)
        .fetch_optional(conn)
        .await
}

/// Global scan fallback for the public invoice endpoint. Codes are only unique per merchant, so
/// ties are broken by creation order.
pub async fn fetch_invoice_by_code_global(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM invoices WHERE code = $1 ORDER BY created_at ASC LIMIT 1")
        .bind(code)
        .fetch_optional(conn)
        .await
}

/// Flips the invoice to paid, but only if it is currently unpaid. Returns `true` if this call won
/// the flip. A concurrent settlement of the same invoice loses here and observes `false`.
pub async fn mark_paid(
    invoice_id: i64,
    amount_paid: MicroUsdc,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE invoices SET paid = 1, amount_paid = $1, paid_at = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 \
         AND paid = 0",
    )
    .bind(amount_paid)
    .bind(paid_at)
    .bind(invoice_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

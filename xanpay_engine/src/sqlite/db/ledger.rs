use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{LedgerEntry, NewLedgerEntry};

/// Appends a ledger entry. The ledger is append-only; this is the only write that ever touches
/// the table.
pub async fn insert_entry(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as::<_, LedgerEntry>(
        r#"
            INSERT INTO ledger (
                merchant_id,
                code,
                entry_type,
                amount,
                currency,
                invoice_code,
                product_name,
                quantity,
                note,
                tx_hash,
                order_id,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(entry.merchant_id)
    .bind(entry.code)
    .bind(entry.entry_type)
    .bind(entry.amount)
    .bind(entry.currency)
    .bind(entry.invoice_code)
    .bind(entry.product_name)
    .bind(entry.quantity)
    .bind(entry.note)
    .bind(entry.tx_hash)
    .bind(entry.order_id)
    .bind(entry.status)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Ledger entry {} recorded for merchant #{}", entry.entry_type, entry.merchant_id);
    Ok(entry)
}

pub async fn fetch_entries_for_merchant(
    merchant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ledger WHERE merchant_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}

pub async fn record_offramp_order(
    merchant_id: i64,
    reference: &str,
    order_id: &str,
    response_body: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO offramp_orders (merchant_id, reference, order_id, response_body) VALUES ($1, $2, $3, $4)",
    )
    .bind(merchant_id)
    .bind(reference)
    .bind(order_id)
    .bind(response_body)
    .execute(conn)
    .await?;
    debug!("🗃️ Off-ramp order {order_id} recorded for merchant #{merchant_id} (ref {reference})");
    Ok(())
}

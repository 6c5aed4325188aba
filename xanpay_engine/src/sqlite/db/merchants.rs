use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{BankDetails, Merchant, NewMerchant},
    traits::PaymentsDatabaseError,
};

pub async fn insert_merchant(
    merchant: NewMerchant,
    conn: &mut SqliteConnection,
) -> Result<Merchant, PaymentsDatabaseError> {
    let result = sqlx::query_as::<_, Merchant>(
        r#"
            INSERT INTO merchants (
                subject_id,
                email,
                password_hash,
                business_name,
                business_image,
                deposit_address,
                provider_address_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(merchant.subject_id)
    .bind(merchant.email)
    .bind(merchant.password_hash)
    .bind(merchant.business_name)
    .bind(merchant.business_image)
    .bind(merchant.deposit_address)
    .bind(merchant.provider_address_id)
    .fetch_one(conn)
    .await;
    match result {
        Ok(merchant) => {
            debug!("🗃️ Merchant {} registered with id {}", merchant.business_name, merchant.id);
            Ok(merchant)
        },
        Err(e) if is_unique_violation(&e, "merchants.email") => Err(PaymentsDatabaseError::EmailAlreadyRegistered),
        Err(e) if is_unique_violation(&e, "merchants.deposit_address") => {
            Err(PaymentsDatabaseError::DepositAddressAlreadyRegistered)
        },
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(e: &sqlx::Error, column: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.message().contains("UNIQUE") && db.message().contains(column))
}

pub async fn fetch_merchant_by_id(
    merchant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM merchants WHERE id = $1").bind(merchant_id).fetch_optional(conn).await
}

pub async fn fetch_merchant_by_subject(
    subject_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM merchants WHERE subject_id = $1").bind(subject_id).fetch_optional(conn).await
}

pub async fn fetch_merchant_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM merchants WHERE email = $1").bind(email).fetch_optional(conn).await
}

/// Exact-match reverse lookup from a deposit address to its owning merchant.
pub async fn fetch_merchant_by_deposit_address(
    address: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM merchants WHERE deposit_address = $1").bind(address).fetch_optional(conn).await
}

pub async fn update_bank_details(
    merchant_id: i64,
    details: BankDetails,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentsDatabaseError> {
    let result = sqlx::query(
        "UPDATE merchants SET bank_institution = $1, bank_account_number = $2, bank_account_name = $3, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $4",
    )
    .bind(details.institution)
    .bind(details.account_number)
    .bind(details.account_name)
    .bind(merchant_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentsDatabaseError::MerchantNotFound);
    }
    debug!("🗃️ Bank details updated for merchant #{merchant_id}");
    Ok(())
}

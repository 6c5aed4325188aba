use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    traits::PaymentsDatabaseError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, PaymentsDatabaseError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            INSERT INTO products (merchant_id, name, image, price, currency, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.merchant_id)
    .bind(product.name)
    .bind(product.image)
    .bind(product.price)
    .bind(product.currency)
    .bind(product.quantity)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] inserted with id {}", product.name, product.id);
    Ok(product)
}

pub async fn fetch_product(
    merchant_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1 AND merchant_id = $2")
        .bind(product_id)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_products_for_merchant(
    merchant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE merchant_id = $1 ORDER BY created_at DESC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}

pub async fn update_product(
    merchant_id: i64,
    product_id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Product, PaymentsDatabaseError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for product {product_id}. Update request skipped.");
        return Err(PaymentsDatabaseError::ProductUpdateNoOp);
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(image) = update.image {
        set_clause.push("image = ");
        set_clause.push_bind_unseparated(image);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(currency) = update.currency {
        set_clause.push("currency = ");
        set_clause.push_bind_unseparated(currency);
    }
    if let Some(quantity) = update.quantity {
        set_clause.push("quantity = ");
        set_clause.push_bind_unseparated(quantity);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder.push(" AND merchant_id = ");
    builder.push_bind(merchant_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder
        .build()
        .fetch_optional(conn)
        .await?
        .map(|row: SqliteRow| Product::from_row(&row))
        .transpose()?
        .ok_or(PaymentsDatabaseError::ProductNotFound)?;
    Ok(product)
}

/// Decrements the quantity on hand by `amount`, but only if at least that much stock remains.
/// Returns the remaining quantity, or `None` if stock was insufficient (no row was touched).
pub async fn decrement_quantity(
    product_id: i64,
    amount: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let remaining: Option<(i64,)> = sqlx::query_as(
        "UPDATE products SET quantity = quantity - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND quantity >= \
         $1 RETURNING quantity",
    )
    .bind(amount)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(remaining.map(|r| r.0))
}

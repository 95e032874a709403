//! Database operations for `products` and `product_images`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A non-deleted row from the `products` table joined with its seller's username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub seller_id: i64,
    pub seller_username: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Lifetime sum of paid order amounts, in whole currency units.
    pub total_sales_amount: i64,
    /// Lifetime count of paid orders.
    pub total_sales: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `product_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Seller-editable product fields.
#[derive(Debug, Clone)]
pub struct ProductInput<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
}

const PRODUCT_COLUMNS: &str = "p.id, p.seller_id, u.username AS seller_username, p.name, \
     p.description, p.price, p.total_sales_amount, p.total_sales, p.created_at, p.updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every listed product, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN users u ON u.id = p.seller_id \
         WHERE p.deleted_at IS NULL \
         ORDER BY p.created_at DESC, p.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a listed product by id, or `None` if it does not exist or was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN users u ON u.id = p.seller_id \
         WHERE p.id = $1 AND p.deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the listed products owned by `seller_id`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_for_seller(
    pool: &PgPool,
    seller_id: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN users u ON u.id = p.seller_id \
         WHERE p.seller_id = $1 AND p.deleted_at IS NULL \
         ORDER BY p.created_at DESC, p.id DESC"
    ))
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a product owned by `seller_id` with zeroed sales counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(
    pool: &PgPool,
    seller_id: i64,
    input: &ProductInput<'_>,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "WITH p AS ( \
             INSERT INTO products (seller_id, name, description, price) \
             VALUES ($1, $2, $3, $4) \
             RETURNING * \
         ) \
         SELECT {PRODUCT_COLUMNS} \
         FROM p \
         JOIN users u ON u.id = p.seller_id"
    ))
    .bind(seller_id)
    .bind(input.name)
    .bind(input.description)
    .bind(input.price)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces the editable fields of a product owned by `seller_id`.
///
/// The seller filter is part of the `WHERE` clause so that a concurrent
/// ownership change cannot be raced.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no listed product with that id belongs to
/// `seller_id`, or [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    seller_id: i64,
    input: &ProductInput<'_>,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "WITH p AS ( \
             UPDATE products \
             SET name = $3, description = $4, price = $5, updated_at = NOW() \
             WHERE id = $1 AND seller_id = $2 AND deleted_at IS NULL \
             RETURNING * \
         ) \
         SELECT {PRODUCT_COLUMNS} \
         FROM p \
         JOIN users u ON u.id = p.seller_id"
    ))
    .bind(id)
    .bind(seller_id)
    .bind(input.name)
    .bind(input.description)
    .bind(input.price)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Soft-deletes a product owned by `seller_id`. Order history keeps its
/// reference to the row.
///
/// Returns `true` if a listed product was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn soft_delete_product(pool: &PgPool, id: i64, seller_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND seller_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(seller_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// product_images
// ---------------------------------------------------------------------------

/// Attaches an image URL to a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_product_image(
    pool: &PgPool,
    product_id: i64,
    image_url: &str,
) -> Result<ProductImageRow, DbError> {
    let row = sqlx::query_as::<_, ProductImageRow>(
        "INSERT INTO product_images (product_id, image_url) \
         VALUES ($1, $2) \
         RETURNING id, product_id, image_url, created_at",
    )
    .bind(product_id)
    .bind(image_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a product's images in the order they were attached.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_images(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ProductImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, image_url, created_at \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! Seller sales aggregations.
//!
//! Every query joins `orders` to `products` and filters on the product's
//! seller, so a seller only ever sees sums of their own listings. Orders count
//! from checkout onwards whether or not payment has been confirmed.
//! Soft-deleted products still contribute their history.

use chrono::{DateTime, NaiveDate, Utc};
use market_core::SalesWindow;
use sqlx::PgPool;

use crate::DbError;

/// Lifetime and trailing-window sums for one seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SalesTotalsRow {
    pub lifetime: i64,
    pub yearly: i64,
    pub monthly: i64,
    pub weekly: i64,
}

impl SalesTotalsRow {
    #[must_use]
    pub fn window(&self, window: SalesWindow) -> i64 {
        match window {
            SalesWindow::Weekly => self.weekly,
            SalesWindow::Monthly => self.monthly,
            SalesWindow::Yearly => self.yearly,
        }
    }
}

/// Sum of order amounts for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DailySalesRow {
    pub day: NaiveDate,
    pub sum: i64,
}

/// Sum of order amounts for one product name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductSalesRow {
    pub product_name: String,
    pub sum: i64,
}

/// Returns lifetime, 365-, 30- and 7-day order sums for `seller_id`.
///
/// Window boundaries come from [`SalesWindow::cutoff`] relative to `today`;
/// an empty window sums to `0`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sales_totals(
    pool: &PgPool,
    seller_id: i64,
    today: NaiveDate,
) -> Result<SalesTotalsRow, DbError> {
    let row = sqlx::query_as::<_, SalesTotalsRow>(
        "SELECT \
             COALESCE(SUM(o.amount), 0)::BIGINT AS lifetime, \
             COALESCE(SUM(o.amount) FILTER (WHERE o.created_at > $2), 0)::BIGINT AS yearly, \
             COALESCE(SUM(o.amount) FILTER (WHERE o.created_at > $3), 0)::BIGINT AS monthly, \
             COALESCE(SUM(o.amount) FILTER (WHERE o.created_at > $4), 0)::BIGINT AS weekly \
         FROM orders o \
         JOIN products p ON p.id = o.product_id \
         WHERE p.seller_id = $1",
    )
    .bind(seller_id)
    .bind(SalesWindow::Yearly.cutoff(today))
    .bind(SalesWindow::Monthly.cutoff(today))
    .bind(SalesWindow::Weekly.cutoff(today))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns per-day order sums created after `since`, ascending by day.
///
/// Days without sales are omitted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn daily_sales(
    pool: &PgPool,
    seller_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<DailySalesRow>, DbError> {
    let rows = sqlx::query_as::<_, DailySalesRow>(
        "SELECT (o.created_at AT TIME ZONE 'UTC')::DATE AS day, \
                SUM(o.amount)::BIGINT AS sum \
         FROM orders o \
         JOIN products p ON p.id = o.product_id \
         WHERE p.seller_id = $1 AND o.created_at > $2 \
         GROUP BY day \
         ORDER BY day",
    )
    .bind(seller_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns lifetime order sums grouped by product name, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_sales(pool: &PgPool, seller_id: i64) -> Result<Vec<ProductSalesRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductSalesRow>(
        "SELECT p.name AS product_name, SUM(o.amount)::BIGINT AS sum \
         FROM orders o \
         JOIN products p ON p.id = o.product_id \
         WHERE p.seller_id = $1 \
         GROUP BY p.name \
         ORDER BY p.name",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

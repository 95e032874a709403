//! Database operations for `orders`.
//!
//! An order is inserted unpaid when a checkout session is created and is
//! flipped to paid exactly once by [`confirm_payment`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub customer_email: String,
    pub product_id: i64,
    pub checkout_session_id: String,
    pub payment_intent: String,
    /// Whole currency units captured from the product price at checkout.
    pub amount: i64,
    pub has_paid: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// An order joined with the name of the product bought.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseRow {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub amount: i64,
    pub has_paid: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Outcome of [`confirm_payment`].
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order: OrderRow,
    /// `false` when the order had already been confirmed; counters were not
    /// touched a second time.
    pub newly_paid: bool,
}

const ORDER_COLUMNS: &str = "id, customer_email, product_id, checkout_session_id, \
     payment_intent, amount, has_paid, created_at, paid_at";

/// Inserts an unpaid order for a freshly created checkout session.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. Reusing a payment intent
/// is a unique violation.
pub async fn create_pending_order(
    pool: &PgPool,
    customer_email: &str,
    product_id: i64,
    checkout_session_id: &str,
    payment_intent: &str,
    amount: i64,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (customer_email, product_id, checkout_session_id, payment_intent, amount) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(customer_email)
    .bind(product_id)
    .bind(checkout_session_id)
    .bind(payment_intent)
    .bind(amount)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the order reconciled against `payment_intent`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_payment_intent(
    pool: &PgPool,
    payment_intent: &str,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent = $1"
    ))
    .bind(payment_intent)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Marks the order for `payment_intent` as paid and bumps the product's
/// lifetime counters (`total_sales + 1`, `total_sales_amount + amount`).
///
/// Runs in one transaction holding a row lock on the order, so concurrent
/// confirmations of the same payment increment the counters once. A repeat
/// confirmation returns the order with `newly_paid = false`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order carries `payment_intent`, or
/// [`DbError::Sqlx`] if any statement fails (the transaction is rolled back).
pub async fn confirm_payment(
    pool: &PgPool,
    payment_intent: &str,
) -> Result<PaymentConfirmation, DbError> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent = $1 FOR UPDATE"
    ))
    .bind(payment_intent)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    if order.has_paid {
        tx.commit().await?;
        return Ok(PaymentConfirmation {
            order,
            newly_paid: false,
        });
    }

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET has_paid = TRUE, paid_at = NOW() \
         WHERE id = $1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE products \
         SET total_sales = total_sales + 1, \
             total_sales_amount = total_sales_amount + $2, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(order.product_id)
    .bind(order.amount)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(PaymentConfirmation {
        order,
        newly_paid: true,
    })
}

/// Returns every order placed with `customer_email`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_customer(
    pool: &PgPool,
    customer_email: &str,
) -> Result<Vec<PurchaseRow>, DbError> {
    let rows = sqlx::query_as::<_, PurchaseRow>(
        "SELECT o.id, o.product_id, p.name AS product_name, o.amount, o.has_paid, \
                o.created_at, o.paid_at \
         FROM orders o \
         JOIN products p ON p.id = o.product_id \
         WHERE o.customer_email = $1 \
         ORDER BY o.created_at DESC, o.id DESC",
    )
    .bind(customer_email)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

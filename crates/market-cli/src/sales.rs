//! `sales` command: a plain-text sales summary for one seller.

use std::fmt::Write as _;

use chrono::Utc;
use market_core::sales::{daily_breakdown_cutoff, SalesWindow, DAILY_BREAKDOWN_DAYS};
use market_db::{DailySalesRow, ProductSalesRow, SalesTotalsRow};

/// Loads and prints lifetime, window, daily and per-product sums.
///
/// # Errors
///
/// Returns an error if the seller does not exist or a query fails.
pub(crate) async fn run_sales(pool: &sqlx::PgPool, username: &str) -> anyhow::Result<()> {
    let seller = market_db::get_user_by_username(pool, username)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no user named '{username}'"))?;

    let today = Utc::now().date_naive();
    let totals = market_db::sales_totals(pool, seller.id, today).await?;
    let daily = market_db::daily_sales(pool, seller.id, daily_breakdown_cutoff(today)).await?;
    let products = market_db::product_sales(pool, seller.id).await?;

    tracing::debug!(seller_id = seller.id, days = daily.len(), "loaded sales summary");
    print!("{}", render_summary(&seller.username, &totals, &daily, &products));
    Ok(())
}

fn render_summary(
    username: &str,
    totals: &SalesTotalsRow,
    daily: &[DailySalesRow],
    products: &[ProductSalesRow],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sales for {username}");
    let _ = writeln!(out, "  lifetime: {}", totals.lifetime);
    for window in SalesWindow::ALL {
        let _ = writeln!(
            out,
            "  {window} ({} days): {}",
            window.days(),
            totals.window(window)
        );
    }

    let _ = writeln!(out, "Daily (last {DAILY_BREAKDOWN_DAYS} days)");
    if daily.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for row in daily {
        let _ = writeln!(out, "  {}: {}", row.day.format("%Y-%m-%d"), row.sum);
    }

    let _ = writeln!(out, "By product");
    if products.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for row in products {
        let _ = writeln!(out, "  {}: {}", row.product_name, row.sum);
    }
    out
}

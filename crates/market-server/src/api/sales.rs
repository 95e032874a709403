use axum::{extract::State, Extension, Json};
use chrono::{NaiveDate, Utc};
use market_core::{sales::daily_breakdown_cutoff, SalesWindow};
use serde::Serialize;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct SalesSummary {
    pub lifetime: i64,
    pub yearly: i64,
    pub monthly: i64,
    pub weekly: i64,
    pub daily: Vec<DailySum>,
    pub products: Vec<ProductSum>,
}

#[derive(Debug, Serialize)]
pub(super) struct DailySum {
    pub day: NaiveDate,
    pub sum: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductSum {
    pub name: String,
    pub sum: i64,
}

/// GET /api/v1/seller/sales — lifetime, window, daily and per-product sums.
pub(super) async fn seller_sales(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SalesSummary>>, ApiError> {
    let rid = &req_id.0;
    let today = Utc::now().date_naive();

    let totals = market_db::sales_totals(&state.pool, user.id, today)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let daily = market_db::daily_sales(&state.pool, user.id, daily_breakdown_cutoff(today))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let products = market_db::product_sales(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        SalesSummary {
            lifetime: totals.lifetime,
            yearly: totals.window(SalesWindow::Yearly),
            monthly: totals.window(SalesWindow::Monthly),
            weekly: totals.window(SalesWindow::Weekly),
            daily: daily
                .into_iter()
                .map(|row| DailySum {
                    day: row.day,
                    sum: row.sum,
                })
                .collect(),
            products: products
                .into_iter()
                .map(|row| ProductSum {
                    name: row.product_name,
                    sum: row.sum,
                })
                .collect(),
        },
    )))
}

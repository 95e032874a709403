//! Public catalog: product index and detail.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub seller: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageItem {
    pub id: i64,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    pub product: ProductItem,
    pub images: Vec<ImageItem>,
    /// Browser-side key for redirecting to the hosted checkout page.
    pub stripe_publishable_key: String,
}

impl From<market_db::ProductRow> for ProductItem {
    fn from(row: market_db::ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            seller: row.seller_username,
            created_at: row.created_at,
        }
    }
}

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = market_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(ProductItem::from).collect();
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let product = market_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "product"))?;

    let images = market_db::list_product_images(&state.pool, product.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(|img| ImageItem {
            id: img.id,
            image_url: img.image_url,
        })
        .collect();

    Ok(Json(ApiResponse::new(
        req_id.0,
        ProductDetail {
            product: product.into(),
            images,
            stripe_publishable_key: state.config.stripe_publishable_key.clone(),
        },
    )))
}

//! Seller product management, gated by ownership.
//!
//! Mutations on a product the caller does not own are answered with a
//! `303 See Other` to [`INVALID_PATH`] and leave the row untouched.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::{CurrentUser, RequestId};

use super::{json_body, map_db_error, ApiError, ApiResponse, AppState, INVALID_PATH};

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SellerProductItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub total_sales: i64,
    pub total_sales_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageCreated {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
}

impl From<market_db::ProductRow> for SellerProductItem {
    fn from(row: market_db::ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            total_sales: row.total_sales,
            total_sales_amount: row.total_sales_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Validated product fields, owned so they outlive the request body.
#[derive(Debug)]
struct ProductFields {
    name: String,
    description: Option<String>,
    price: Decimal,
}

impl ProductFields {
    fn as_input(&self) -> market_db::ProductInput<'_> {
        market_db::ProductInput {
            name: &self.name,
            description: self.description.as_deref(),
            price: self.price,
        }
    }
}

fn validate_product(req_id: &str, body: ProductRequest) -> Result<ProductFields, ApiError> {
    let name = body.name.trim().to_owned();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("name must be 1–{MAX_NAME_LEN} characters"),
        ));
    }
    let price =
        market_core::validate_price(body.price).map_err(|e| ApiError::validation(req_id, &e))?;
    let description = body
        .description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty());

    Ok(ProductFields {
        name,
        description,
        price,
    })
}

fn validate_image_url(req_id: &str, value: &str) -> Result<String, ApiError> {
    let invalid = || {
        ApiError::new(
            req_id,
            "validation_error",
            format!("image_url must be an absolute http(s) URL, got '{value}'"),
        )
    };
    let url = reqwest::Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url.to_string())
}

/// Outcome of resolving a product for mutation by the current user.
enum Ownership {
    Owned(market_db::ProductRow),
    Foreign,
}

async fn resolve_owned_product(
    state: &AppState,
    req_id: &str,
    id: i64,
    user: &CurrentUser,
) -> Result<Ownership, ApiError> {
    let product = market_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::not_found(req_id, "product"))?;

    if product.seller_id == user.id {
        Ok(Ownership::Owned(product))
    } else {
        tracing::warn!(
            product_id = id,
            owner_id = product.seller_id,
            user_id = user.id,
            "rejected mutation of another seller's product"
        );
        Ok(Ownership::Foreign)
    }
}

/// GET /api/v1/seller/dashboard
pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<SellerProductItem>>>, ApiError> {
    let rows = market_db::list_products_for_seller(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(SellerProductItem::from).collect();
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

/// POST /api/v1/seller/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SellerProductItem>>), ApiError> {
    let rid = &req_id.0;
    let fields = validate_product(rid, json_body(rid, body)?)?;

    let row = market_db::create_product(&state.pool, user.id, &fields.as_input())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(product_id = row.id, seller_id = user.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0.clone(), row.into())),
    ))
}

/// PUT /api/v1/seller/products/{id}
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    if let Ownership::Foreign = resolve_owned_product(&state, rid, id, &user).await? {
        return Ok(Redirect::to(INVALID_PATH).into_response());
    }
    let fields = validate_product(rid, json_body(rid, body)?)?;

    let row = market_db::update_product(&state.pool, id, user.id, &fields.as_input())
        .await
        .map_err(|e| match e {
            market_db::DbError::NotFound => ApiError::not_found(rid, "product"),
            other => map_db_error(rid.clone(), &other),
        })?;

    tracing::info!(product_id = row.id, seller_id = user.id, "product updated");

    let data: SellerProductItem = row.into();
    Ok(Json(ApiResponse::new(req_id.0.clone(), data)).into_response())
}

/// DELETE /api/v1/seller/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    if let Ownership::Foreign = resolve_owned_product(&state, rid, id, &user).await? {
        return Ok(Redirect::to(INVALID_PATH).into_response());
    }

    let deleted = market_db::soft_delete_product(&state.pool, id, user.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::not_found(rid, "product"));
    }

    tracing::info!(product_id = id, seller_id = user.id, "product deleted");

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        serde_json::json!({ "deleted": true }),
    ))
    .into_response())
}

/// POST /api/v1/seller/products/{id}/images
pub(super) async fn add_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    let product = match resolve_owned_product(&state, rid, id, &user).await? {
        Ownership::Owned(product) => product,
        Ownership::Foreign => return Ok(Redirect::to(INVALID_PATH).into_response()),
    };
    let image_url = validate_image_url(rid, &json_body(rid, body)?.image_url)?;

    let row = market_db::add_product_image(&state.pool, product.id, &image_url)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(product_id = product.id, image_id = row.id, "product image added");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            req_id.0.clone(),
            ImageCreated {
                id: row.id,
                product_id: row.product_id,
                image_url: row.image_url,
            },
        )),
    )
        .into_response())
}

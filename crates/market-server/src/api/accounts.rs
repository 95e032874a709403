//! Registration, login, logout and purchase history.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use market_core::RegistrationInput;
use serde::{Deserialize, Serialize};

use crate::middleware::{CurrentUser, RequestId};

use super::{json_body, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AccountItem {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PurchaseItem {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub amount: i64,
    pub has_paid: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

fn session_expiry(now: DateTime<Utc>, ttl_hours: i64) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::try_hours(ttl_hours)?)
}

/// POST /api/v1/accounts/register
pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AccountItem>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let input = RegistrationInput {
        username: body.username,
        email: body.email,
        password: body.password,
        password_confirm: body.password_confirm,
    }
    .validate()
    .map_err(|e| ApiError::validation(rid, &e))?;

    let password = market_core::hash_password(&input.password, &state.config.password_pepper);
    let user = market_db::create_user(&state.pool, &input.username, &input.email, &password)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(rid, "conflict", "a user with that username already exists")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            req_id.0.clone(),
            AccountItem {
                id: user.id,
                username: user.username,
                email: user.email,
            },
        )),
    ))
}

/// POST /api/v1/accounts/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SessionToken>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let rejected = || ApiError::new(rid, "unauthorized", "invalid username or password");

    let user = market_db::get_user_by_username(&state.pool, body.username.trim())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(rejected)?;

    let pepper = &state.config.password_pepper;
    if !market_core::verify_password(&body.password, pepper, &user.stored_password()) {
        tracing::info!(user_id = user.id, "login rejected: wrong password");
        return Err(rejected());
    }

    let pruned = market_db::delete_expired_sessions(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let expires_at = session_expiry(Utc::now(), state.config.session_ttl_hours)
        .ok_or_else(|| ApiError::new(rid, "internal_error", "session lifetime out of range"))?;
    let (token, token_hash) = market_core::new_session_token();
    market_db::create_session(&state.pool, user.id, &token_hash, expires_at)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(user_id = user.id, pruned, "session opened");

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        SessionToken { token, expires_at },
    )))
}

/// POST /api/v1/accounts/logout
pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    market_db::delete_session(&state.pool, &user.token_hash)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id = user.id, "session closed");

    Ok(Json(ApiResponse::new(
        req_id.0,
        serde_json::json!({ "logged_out": true }),
    )))
}

/// GET /api/v1/accounts/purchases
pub(super) async fn list_purchases(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PurchaseItem>>>, ApiError> {
    let rows = market_db::list_orders_for_customer(&state.pool, &user.email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| PurchaseItem {
            order_id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            amount: row.amount,
            has_paid: row.has_paid,
            created_at: row.created_at,
            paid_at: row.paid_at,
        })
        .collect();

    Ok(Json(ApiResponse::new(req_id.0, data)))
}

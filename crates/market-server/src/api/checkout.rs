//! Checkout initiation, payment confirmation and the redirect targets.
//!
//! A checkout creates a hosted session at the payment provider and a pending
//! order keyed by the session's payment intent. The provider later redirects
//! the buyer to the success target with the session id, which is resolved
//! back to the payment intent and confirmed exactly once.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use market_stripe::{
    types::CHECKOUT_SESSION_ID_PLACEHOLDER, CreateCheckoutSession, StripeError,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{json_body, map_db_error, map_stripe_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Hosted payment page, when the provider returns one.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SuccessQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct PaidOrder {
    pub order_id: i64,
    pub product_id: i64,
    pub customer_email: String,
    pub amount: i64,
    pub has_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    /// `false` when this session had already been confirmed.
    pub newly_paid: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct PaymentFailed {
    pub status: &'static str,
}

/// POST /api/v1/products/{id}/checkout
pub(super) async fn create_checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CheckoutResponse>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let email = body.email.trim();
    market_core::validate_email(email).map_err(|e| ApiError::validation(rid, &e))?;

    let product = market_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "product"))?;

    let base = &state.config.public_base_url;
    let success_url =
        format!("{base}/api/v1/payments/success?session_id={CHECKOUT_SESSION_ID_PLACEHOLDER}");
    let cancel_url = format!("{base}/api/v1/payments/failed");

    let session = state
        .stripe
        .create_checkout_session(&CreateCheckoutSession {
            customer_email: email,
            product_name: &product.name,
            unit_amount: market_core::unit_amount_minor(product.price),
            currency: &state.config.currency,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await
        .map_err(|e| map_stripe_error(rid.clone(), &e))?;

    let payment_intent = session
        .require_payment_intent()
        .map_err(|e| map_stripe_error(rid.clone(), &e))?;

    let order = market_db::create_pending_order(
        &state.pool,
        email,
        product.id,
        &session.id,
        payment_intent,
        market_core::order_amount(product.price),
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            ApiError::new(rid, "conflict", "an order already exists for this payment")
        } else {
            map_db_error(rid.clone(), &e)
        }
    })?;

    tracing::info!(
        order_id = order.id,
        product_id = product.id,
        session_id = %session.id,
        payment_intent = %order.payment_intent,
        amount = order.amount,
        "checkout session created"
    );

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        CheckoutResponse {
            session_id: session.id,
            url: session.url,
        },
    )))
}

/// GET /api/v1/payments/success?session_id=
pub(super) async fn payment_success(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<ApiResponse<PaidOrder>>, ApiError> {
    let rid = &req_id.0;
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::not_found(rid, "checkout session"))?;

    let session = state
        .stripe
        .retrieve_checkout_session(session_id)
        .await
        .map_err(|e| match e {
            StripeError::NotFound(_) => ApiError::not_found(rid, "checkout session"),
            other => map_stripe_error(rid.clone(), &other),
        })?;

    if session.payment_status.as_deref() == Some("unpaid") {
        tracing::warn!(session_id, "success target hit for an unpaid session");
        return Err(ApiError::new(
            rid,
            "conflict",
            "payment for this session has not completed",
        ));
    }

    let payment_intent = session
        .require_payment_intent()
        .map_err(|_| ApiError::not_found(rid, "order"))?;

    let confirmation = market_db::confirm_payment(&state.pool, payment_intent)
        .await
        .map_err(|e| match e {
            market_db::DbError::NotFound => ApiError::not_found(rid, "order"),
            other => map_db_error(rid.clone(), &other),
        })?;

    let order = confirmation.order;
    if confirmation.newly_paid {
        tracing::info!(
            order_id = order.id,
            product_id = order.product_id,
            payment_intent,
            amount = order.amount,
            "payment confirmed"
        );
    } else {
        tracing::debug!(order_id = order.id, "payment already confirmed");
    }

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        PaidOrder {
            order_id: order.id,
            product_id: order.product_id,
            customer_email: order.customer_email,
            amount: order.amount,
            has_paid: order.has_paid,
            paid_at: order.paid_at,
            newly_paid: confirmation.newly_paid,
        },
    )))
}

/// GET /api/v1/payments/failed
pub(super) async fn payment_failed(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<PaymentFailed>> {
    Json(ApiResponse::new(req_id.0, PaymentFailed { status: "failed" }))
}

/// GET /api/v1/invalid
pub(super) async fn invalid(Extension(req_id): Extension<RequestId>) -> ApiError {
    ApiError::new(
        req_id.0,
        "invalid",
        "you are not allowed to modify this product",
    )
}

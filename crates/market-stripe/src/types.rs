//! Stripe checkout request and response types.

use serde::Deserialize;

use crate::error::StripeError;

/// Placeholder Stripe substitutes with the real session id on redirect.
pub const CHECKOUT_SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Parameters for a single-item, card-only, one-off payment session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSession<'a> {
    pub customer_email: &'a str,
    pub product_name: &'a str,
    /// Price in minor currency units (cents).
    pub unit_amount: i64,
    /// ISO 4217 code, lowercase.
    pub currency: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

impl CreateCheckoutSession<'_> {
    /// Flattens the request into Stripe's bracketed form-encoding.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("customer_email", self.customer_email.to_owned()),
            ("payment_method_types[0]", "card".to_owned()),
            (
                "line_items[0][price_data][currency]",
                self.currency.to_owned(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                self.product_name.to_owned(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                self.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_owned()),
            ("mode", "payment".to_owned()),
            ("success_url", self.success_url.to_owned()),
            ("cancel_url", self.cancel_url.to_owned()),
        ]
    }
}

/// The subset of a Stripe `checkout.session` object this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page URL; absent once the session has completed.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSession {
    /// Returns the payment intent id that keys the local order.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::MissingPaymentIntent`] if the session has none.
    pub fn require_payment_intent(&self) -> Result<&str, StripeError> {
        self.payment_intent
            .as_deref()
            .filter(|pi| !pi.is_empty())
            .ok_or_else(|| StripeError::MissingPaymentIntent(self.id.clone()))
    }
}

/// Stripe error envelope: `{"error": {"type", "code", "message"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

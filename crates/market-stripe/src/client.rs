//! HTTP client for the Stripe checkout API.
//!
//! Wraps `reqwest` with secret-key auth, form-encoded requests and typed
//! error mapping. Non-2xx answers are decoded from Stripe's error envelope;
//! 404 and `resource_missing` surface as [`StripeError::NotFound`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::StripeError;
use crate::retry::retry_with_backoff;
use crate::types::{CheckoutSession, CreateCheckoutSession, ErrorEnvelope};

const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Pinned API version. Newer versions create the payment intent lazily, after
/// the buyer submits the hosted page, which would leave a fresh session with
/// no reconciliation key.
const STRIPE_VERSION: &str = "2020-08-27";

/// Client for the Stripe REST API.
///
/// Rooted at the configured `STRIPE_API_BASE`.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl StripeClient {
    /// Creates a client rooted at `base_url` (`https://api.stripe.com/` in production).
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StripeError::InvalidBaseUrl`] if `base_url`
    /// is not an absolute URL.
    pub fn with_base_url(
        secret_key: &str,
        timeout_secs: u64,
        base_url: &str,
        max_retries: u32,
    ) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("market/0.1")
            .build()?;

        // Exactly one trailing slash so that `join("v1/...")` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised)
            .map_err(|_| StripeError::InvalidBaseUrl(base_url.to_owned()))?;
        if parsed.cannot_be_a_base() {
            return Err(StripeError::InvalidBaseUrl(base_url.to_owned()));
        }

        Ok(Self {
            client,
            secret_key: secret_key.to_owned(),
            base_url: parsed,
            max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry back-off base delay.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Creates a hosted checkout session (`POST /v1/checkout/sessions`).
    ///
    /// Not retried: a repeated create would open a second session.
    ///
    /// # Errors
    ///
    /// - [`StripeError::Api`] if Stripe rejects the request.
    /// - [`StripeError::Http`] on network failure.
    /// - [`StripeError::Deserialize`] if the response does not match
    ///   [`CheckoutSession`].
    pub async fn create_checkout_session(
        &self,
        params: &CreateCheckoutSession<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let url = self.endpoint(&["v1", "checkout", "sessions"])?;
        let request = self.client.post(url).form(&params.to_form());
        let session: CheckoutSession = self.send_json(request, "create checkout session").await?;

        tracing::debug!(
            session_id = %session.id,
            payment_intent = session.payment_intent.as_deref().unwrap_or(""),
            "created Stripe checkout session"
        );
        Ok(session)
    }

    /// Retrieves a checkout session by id (`GET /v1/checkout/sessions/{id}`).
    ///
    /// Transient failures are retried up to the configured `max_retries`.
    ///
    /// # Errors
    ///
    /// - [`StripeError::NotFound`] if Stripe has no session with that id.
    /// - [`StripeError::Api`] for any other error answer.
    /// - [`StripeError::Http`] on network failure after retries.
    /// - [`StripeError::Deserialize`] if the response does not match
    ///   [`CheckoutSession`].
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let url = self.endpoint(&["v1", "checkout", "sessions", session_id])?;
        let context = format!("retrieve checkout session {session_id}");

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self.client.get(url.clone());
            self.send_json(request, &context)
        })
        .await
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StripeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StripeError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request and decodes either the success body or
    /// Stripe's error envelope.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, StripeError> {
        let response = request
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_VERSION)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &body, context));
        }

        serde_json::from_str(&body).map_err(|e| StripeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    fn map_error(status: u16, body: &str, context: &str) -> StripeError {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
        let code = envelope.as_ref().and_then(|e| e.error.code.clone());
        let message = envelope
            .and_then(|e| e.error.message.or(e.error.kind))
            .unwrap_or_else(|| format!("{context} failed with HTTP {status}"));

        if status == 404 || code.as_deref() == Some("resource_missing") {
            return StripeError::NotFound(message);
        }
        StripeError::Api {
            status,
            code,
            message,
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

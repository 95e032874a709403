//! Client for the Stripe-compatible hosted checkout API.
//!
//! Only two calls are made: create a checkout session for a single line item
//! and retrieve a session to read its payment intent.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{CheckoutSession, CreateCheckoutSession};

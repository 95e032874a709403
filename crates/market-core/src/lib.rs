pub mod accounts;
mod app_config;
mod config;
pub mod money;
pub mod sales;

pub use accounts::{
    hash_password, hash_session_token, new_session_token, validate_email, verify_password,
    PasswordHash, RegistrationInput,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use money::{order_amount, unit_amount_minor, validate_price};
pub use sales::SalesWindow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// A rejected piece of user input, carrying the field name for error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Absolute origin the payment provider redirects buyers back to.
    pub public_base_url: String,
    /// Lowercase ISO 4217 code sent with every checkout line item.
    pub currency: String,
    pub password_pepper: String,
    pub session_ttl_hours: i64,
    pub rate_limit_per_minute: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub stripe_api_base: String,
    pub stripe_request_timeout_secs: u64,
    pub stripe_max_retries: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("public_base_url", &self.public_base_url)
            .field("currency", &self.currency)
            .field("database_url", &"[redacted]")
            .field("password_pepper", &"[redacted]")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("stripe_secret_key", &"[redacted]")
            .field("stripe_publishable_key", &self.stripe_publishable_key)
            .field("stripe_api_base", &self.stripe_api_base)
            .field(
                "stripe_request_timeout_secs",
                &self.stripe_request_timeout_secs,
            )
            .field("stripe_max_retries", &self.stripe_max_retries)
            .finish()
    }
}

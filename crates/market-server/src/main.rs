mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::middleware::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(market_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = market_db::PoolConfig::from_app_config(&config);
    let pool = market_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = market_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let stripe = market_stripe::StripeClient::with_base_url(
        &config.stripe_secret_key,
        config.stripe_request_timeout_secs,
        &config.stripe_api_base,
        config.stripe_max_retries,
    )?;

    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let bind_addr = config.bind_addr;
    tracing::info!(env = %config.env, %bind_addr, "starting market-server");

    let app = build_app(
        AppState {
            pool,
            stripe,
            config,
        },
        rate_limit,
    );

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

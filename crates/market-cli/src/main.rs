mod sales;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "market-cli")]
#[command(about = "Marketplace operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Print the sales summary for a seller
    Sales {
        /// Seller username
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = market_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = market_db::PoolConfig::from_app_config(&config);
    let pool = market_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = market_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Sales { username } => sales::run_sales(&pool, &username).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;

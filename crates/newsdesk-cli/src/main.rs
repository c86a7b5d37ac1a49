mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsdesk-cli")]
#[command(about = "newsdesk command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one collection pass now and print its summary
    Collect {
        /// Listing pages to walk (defaults by whether anything is stored yet)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        pages: Option<u32>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Print stored article counts and the latest url
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = newsdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = newsdesk_db::PoolConfig::from_app_config(&config);
    let pool = newsdesk_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Collect { pages } => commands::run_collect(&pool, &config, pages).await?,
        Commands::Migrate => commands::run_migrate(&pool).await?,
        Commands::Stats => commands::run_stats(&pool).await?,
    }

    pool.close().await;
    Ok(())
}

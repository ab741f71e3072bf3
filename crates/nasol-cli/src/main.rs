mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nasol-cli")]
#[command(about = "나는솔로 news feed command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one news collection pass and print its report
    Collect,
    /// Back-fill thumbnails for articles that have none
    Enrich {
        /// Articles to visit (1-100; anything else uses the default of 20)
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Show recent function-run audit records
    Logs {
        /// Maximum number of records to show
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Only show runs of this function (e.g. `scheduled-news-fetch`)
        #[arg(long)]
        function: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = nasol_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = nasol_db::PoolConfig::from_app_config(&config);
    let pool = nasol_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Collect => commands::run_collect(pool, &config).await,
        Commands::Enrich { limit } => commands::run_enrich(pool, &config, limit).await,
        Commands::Migrate => commands::run_migrate(&pool).await,
        Commands::Logs { limit, function } => {
            commands::run_logs(&pool, function.as_deref(), limit).await
        }
    }
}

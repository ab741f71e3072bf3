mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use nasol_ingest::PgArticleStore;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::FunctionAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(nasol_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let program = Arc::new(nasol_core::load_program(&config.program_path)?);
    tracing::info!(
        program = %program.name,
        keywords = program.keywords.len(),
        strategy = %config.effective_dedup_strategy(),
        "configuration loaded"
    );

    let pool_config = nasol_db::PoolConfig::from_app_config(&config);
    let pool = nasol_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = nasol_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let store = Arc::new(PgArticleStore::new(pool.clone()));
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        program,
        store,
    };

    let _scheduler = scheduler::build_scheduler(state.clone()).await?;

    let auth = FunctionAuth::from_config(&config)?;
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

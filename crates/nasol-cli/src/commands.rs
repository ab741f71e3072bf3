//! Subcommand handlers. Each one runs after config and the pool are ready.

use std::time::Duration;

use nasol_core::AppConfig;
use nasol_ingest::{collect_news, normalize_limit, run_thumbnail_enrichment, PgArticleStore};
use sqlx::PgPool;

/// How long `collect` keeps the process alive for the enrichment trigger.
const TRIGGER_WAIT: Duration = Duration::from_secs(70);

/// Run one collection pass against the configured program, wait for the
/// enrichment trigger to be delivered, and print the report as JSON.
///
/// # Errors
///
/// Returns an error if the program file cannot be loaded or the run fails.
pub(crate) async fn run_collect(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let program = nasol_core::load_program(&config.program_path)?;
    let store = PgArticleStore::new(pool);

    let report = collect_news(config, &program, &store)
        .await
        .wait_for_trigger(TRIGGER_WAIT)
        .await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        anyhow::bail!(
            "news collection failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Run one thumbnail back-fill batch and print its counts.
///
/// # Errors
///
/// Returns an error if selecting the batch fails.
pub(crate) async fn run_enrich(
    pool: PgPool,
    config: &AppConfig,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let store = PgArticleStore::new(pool);
    let limit = normalize_limit(limit);

    let (result, elapsed_ms) = run_thumbnail_enrichment(config, &store, limit).await;
    let report = result?;

    println!(
        "scanned {} article(s): {} updated, {} failed ({elapsed_ms} ms)",
        report.scanned, report.updated, report.failed
    );
    Ok(())
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = nasol_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Print the most recent function-run records, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_logs(
    pool: &PgPool,
    function: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    let logs = nasol_db::list_function_logs(pool, function, limit.max(1)).await?;

    if logs.is_empty() {
        println!(
            "no function logs found{}",
            function
                .map(|f| format!(" for '{f}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<8}{:<24}{:<10}{:<12}{:<18}ERROR",
        "ID", "FUNCTION", "STATUS", "ELAPSED", "CREATED"
    );
    for log in &logs {
        let created = log.created_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<8}{:<24}{:<10}{:<12}{:<18}{}",
            log.id,
            log.function_name,
            log.status,
            format!("{} ms", log.execution_time),
            created,
            log.error_message.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

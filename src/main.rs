use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::{
    config::Config,
    load::{process_data, LogFiles, SongFiles},
    store::{memory::MemStore, postgres::PgStore, Store},
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Config::parse();
    info!("startup");

    // ─── 2) dry run: full pipeline, no database ──────────────────────
    if config.dry_run {
        let mut store = MemStore::new();
        run(&mut store, &config).await?;
        for (table, rows) in store.counts() {
            info!("{}: {} rows (dry run, not persisted)", table, rows);
        }
        return Ok(());
    }

    // ─── 3) open the single store connection ─────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(config.connect_options())
        .await
        .context("failed to connect to database")?;
    let mut store = PgStore::new(pool.clone());

    // ─── 4) load both trees, then release the pool on every path ─────
    let result = run(&mut store, &config).await;
    pool.close().await;
    result
}

async fn run(store: &mut dyn Store, config: &Config) -> Result<()> {
    process_data(store, &config.song_data_root, &SongFiles).await?;
    process_data(store, &config.log_data_root, &LogFiles).await?;
    Ok(())
}

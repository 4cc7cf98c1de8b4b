mod config;
mod error;
mod generator;
mod intent;
mod logger;
mod models;
mod router;
mod sanitizer;
mod storage;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use config::{api_key, config_path, load_or_init};
use generator::GeminiGenerator;
use router::{run_router, RouterState};
use storage::{init_db, seed_from_file, SqliteMediaStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config_path = config_path();
  let config = load_or_init(&config_path)
    .with_context(|| format!("loading config from {}", config_path.display()))?;

  logger::init(&config.log_level, config.log_path.as_deref())?;
  info!(version = env!("CARGO_PKG_VERSION"), config = %config_path.display(), "aura-relay starting up");

  let conn = init_db(&config.database_path)
    .with_context(|| format!("opening media store {}", config.database_path.display()))?;
  let store = SqliteMediaStore::new(conn, config.keyword_policy);

  if let Some(seed_path) = config.seed_path.as_deref() {
    let count = seed_from_file(&store, seed_path)
      .await
      .with_context(|| format!("seeding media from {}", seed_path.display()))?;
    info!(count, path = %seed_path.display(), "seeded media records");
  }

  let generator = GeminiGenerator::new(
    &config.gemini_api_base,
    &config.gemini_model,
    api_key()?,
    config.client_timeout(),
  )?;

  let state = RouterState {
    started_at: Instant::now(),
    generation_timeout: config.request_timeout(),
    store: Arc::new(store),
    generator: Arc::new(generator),
  };

  let listener = tokio::net::TcpListener::bind(&config.bind_address)
    .await
    .with_context(|| format!("binding {}", config.bind_address))?;
  info!(addr = %listener.local_addr()?, "chat endpoint listening");

  run_router(listener, state).await?;
  info!("aura-relay stopped");
  Ok(())
}

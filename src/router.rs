use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, Instrument};

use crate::error::RelayError;
use crate::generator::TextGenerator;
use crate::intent::{classify, Intent};
use crate::models::{ChatRequest, ChatResponse, HealthResponse, MediaKind};
use crate::sanitizer::sanitize;
use crate::storage::MediaStore;

pub struct RouterState {
  pub started_at: Instant,
  pub generation_timeout: Duration,
  pub store: Arc<dyn MediaStore>,
  pub generator: Arc<dyn TextGenerator>,
}

pub fn build(state: RouterState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/api/chat", post(chat))
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(Arc::new(state))
}

pub async fn run_router(listener: tokio::net::TcpListener, state: RouterState) -> anyhow::Result<()> {
  axum::serve(listener, build(state))
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ok".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    uptime_ms: state.started_at.elapsed().as_millis(),
  })
}

async fn chat(
  State(state): State<Arc<RouterState>>,
  Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, RelayError> {
  let request_id = uuid::Uuid::new_v4();
  let span = info_span!("chat", %request_id);
  respond(&state, &req.message).instrument(span).await.map(Json)
}

async fn respond(state: &RouterState, message: &str) -> Result<ChatResponse, RelayError> {
  let intent = classify(message);
  info!(?intent, "classified message");

  if intent == Intent::Image {
    if let Some(record) = state.store.find_media(MediaKind::Image, message).await? {
      info!("image matched, skipping generation");
      let mut res = ChatResponse::assistant("");
      record.attach(&mut res);
      return Ok(res);
    }
    info!("no image matched, falling back to text");
    return Ok(ChatResponse::assistant(generate(state, message).await?));
  }

  let mut res = ChatResponse::assistant(generate(state, message).await?);

  if let Some(kind) = intent.media_kind() {
    match state.store.find_media(kind, message).await? {
      Some(record) => {
        info!(kind = kind.as_str(), "media matched");
        record.attach(&mut res);
      }
      None => info!(kind = kind.as_str(), "no media matched"),
    }
  }

  Ok(res)
}

async fn generate(state: &RouterState, message: &str) -> Result<String, RelayError> {
  let started = Instant::now();
  let reply = tokio::time::timeout(state.generation_timeout, state.generator.generate(message))
    .await
    .map_err(|_| RelayError::Timeout(state.generation_timeout))??;
  info!(took_ms = started.elapsed().as_millis() as u64, "generation finished");
  Ok(sanitize(reply.trim()))
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(err) = tokio::signal::ctrl_c().await {
      tracing::warn!(error = %err, "failed to install Ctrl-C handler");
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
      Ok(mut s) => {
        s.recv().await;
      }
      Err(err) => tracing::warn!(error = %err, "failed to install SIGTERM handler"),
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {}
    _ = terminate => {}
  }
  info!("shutdown signal received");
}

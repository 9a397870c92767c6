//! Quizsmith · Quiz Backend
//!
//! - Axum HTTP API: generate quizzes, score-and-save attempts, list history, report card
//! - OpenAI-backed generation (via environment variables)
//! - SQLite attempt history
//!
//! Important env variables (see `config` for the full list):
//!   PORT            : u16 (default 3000)
//!   DATABASE_PATH   : attempts database (default "quiz_attempts.db")
//!   OPENAI_API_KEY  : enables quiz generation if present
//!   QUIZ_CONFIG_PATH: path to TOML config (prompts + temperature)
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use quizsmith_backend::config::Settings;
use quizsmith_backend::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  dotenvy::dotenv().ok();
  telemetry::init_tracing();

  let settings = Settings::from_env();

  // Shared application state (generator + attempt store).
  let state = Arc::new(AppState::from_settings(&settings)?);

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizsmith", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quizsmith", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "quizsmith", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}

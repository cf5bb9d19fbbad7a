//! Binary entrypoint for the aqa Control API server.
//!
//! Reads configuration from environment variables:
//! - `AQA_SERVER_PORT`: server listen port (default: "3000")
//! - `AQA_STORAGE_PATH`, `AQA_STORAGE_BACKEND`, `AQA_S3_BUCKET`: history/cache/version backend selection
//! - `AQA_LLM_MODE`, `BRAIN_MODEL`, `BRAIN_LLM_PROVIDER`, `BRAIN_LLM_FALLBACK`, `OPENAI_API_KEY`/`XAI_API_KEY`/`ANTHROPIC_API_KEY`: provider wiring

use aqa_server::router::build_router;
use aqa_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port = std::env::var("AQA_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());

    let state = AppState::from_env();
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "aqa-server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

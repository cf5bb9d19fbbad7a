//! `GET /health`: liveness plus component reachability -- is the executor
//! binary findable, is an LLM provider configured, can storage be read.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use aqa_orchestrate::locate_executor;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub version: &'static str,
    pub executor: ComponentHealth,
    pub llm: ComponentHealth,
    pub storage: ComponentHealth,
}

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthBody>> {
    let executor = check_executor(&state);
    let llm = check_llm();
    let storage = check_storage(&state);

    let status = if executor.ok && llm.ok && storage.ok { "ok" } else { "degraded" };

    Json(ApiResponse::ok(HealthBody {
        status,
        version: env!("CARGO_PKG_VERSION"),
        executor,
        llm,
        storage,
    }))
}

fn check_executor(state: &AppState) -> ComponentHealth {
    match locate_executor(state.executor_override.as_deref()) {
        Ok(path) => ComponentHealth { ok: true, detail: path.display().to_string() },
        Err(tried) => ComponentHealth {
            ok: false,
            detail: format!("executor binary not found, tried: {}", tried.join(", ")),
        },
    }
}

fn check_llm() -> ComponentHealth {
    if std::env::var("AQA_LLM_MODE").as_deref() == Ok("mock") {
        return ComponentHealth { ok: true, detail: "mock provider".to_string() };
    }

    let configured: Vec<&str> = [("openai", "OPENAI_API_KEY"), ("xai", "XAI_API_KEY"), ("anthropic", "ANTHROPIC_API_KEY")]
        .into_iter()
        .filter(|(_, var)| std::env::var(var).is_ok())
        .map(|(name, _)| name)
        .collect();

    if configured.is_empty() {
        ComponentHealth { ok: false, detail: "no LLM credentials configured".to_string() }
    } else {
        ComponentHealth { ok: true, detail: format!("credentials present: {}", configured.join(", ")) }
    }
}

fn check_storage(state: &AppState) -> ComponentHealth {
    let cache_stats = state.cache.stats();
    if let Err(e) = state.versions.list_plans() {
        return ComponentHealth { ok: false, detail: format!("version store unreachable: {e}") };
    }
    if let Err(e) = state.history.stats() {
        return ComponentHealth { ok: false, detail: format!("history store unreachable: {e}") };
    }

    ComponentHealth {
        ok: true,
        detail: format!("versions and history reachable, cache enabled={}", cache_stats.enabled),
    }
}

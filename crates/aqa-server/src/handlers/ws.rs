//! `WS /ws/execute`: streams a synthetic per-step narrative around one
//! orchestrator invocation, over a `{"action": "execute"|"cancel"|"ping"}`
//! -> `{"event": ...}` protocol -- one connection, one execution, no
//! multi-client fan-out, since each socket drives its own run.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use aqa_core::Plan;
use aqa_orchestrate::{events_for_report, run_plan, ExecutionEvent, OrchestrateError, RunnerResult};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientMessage {
    Execute { plan: serde_json::Value },
    Cancel,
    Ping,
}

/// A run in flight: its declared step ids (needed to synthesize the event
/// narrative once the report lands) and the task driving `run_plan`.
/// Dropping/aborting the handle drops the future mid-`child.wait()`, which
/// kills the subprocess (`Command::kill_on_drop(true)` in aqa-orchestrate).
struct InFlightRun {
    declared_step_ids: Vec<String>,
    handle: tokio::task::JoinHandle<Result<RunnerResult, OrchestrateError>>,
}

pub async fn ws_execute(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let execution_id = uuid::Uuid::new_v4().simple().to_string()[..12].to_string();

    if socket
        .send(Message::Text(json!({"event": "connected", "execution_id": execution_id}).to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut running: Option<InFlightRun> = None;

    loop {
        let Some(mut run) = running.take() else {
            match socket.recv().await {
                Some(Ok(Message::Text(text))) => {
                    match on_client_message(&text, &mut socket, &state, &execution_id).await {
                        ClientOutcome::Started(run) => running = Some(run),
                        ClientOutcome::Continue => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            }
            continue;
        };

        // `run` is owned here, not borrowed from `running`, so each arm is
        // free to decide whether the run continues (`running = Some(run)`)
        // or ends (left `None`) without fighting the select future's borrow.
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Cancel) => {
                                run.handle.abort();
                                let _ = send_event(&mut socket, &json!({"execution_id": execution_id}), "execution_cancelled").await;
                            }
                            Ok(ClientMessage::Ping) => {
                                let _ = send_event(&mut socket, &json!({}), "pong").await;
                                running = Some(run);
                            }
                            Ok(ClientMessage::Execute { .. }) => {
                                let _ = send_event(
                                    &mut socket,
                                    &json!({"code": "E1010", "message": "an execution is already in flight on this connection"}),
                                    "error",
                                ).await;
                                running = Some(run);
                            }
                            Err(_) => {
                                let _ = send_event(&mut socket, &json!({"code": "E1009", "message": "invalid JSON"}), "error").await;
                                running = Some(run);
                            }
                        }
                    }
                    Some(Ok(_)) => running = Some(run),
                    Some(Err(_)) | None => break,
                }
            }
            result = &mut run.handle => {
                stream_result(&mut socket, &run.declared_step_ids, result).await;
            }
        }
    }
}

enum ClientOutcome {
    Started(InFlightRun),
    Continue,
}

async fn on_client_message(
    text: &str,
    socket: &mut WebSocket,
    state: &AppState,
    execution_id: &str,
) -> ClientOutcome {
    match serde_json::from_str::<ClientMessage>(text) {
        Err(_) => {
            let _ = send_event(socket, &json!({"code": "E1009", "message": "invalid JSON"}), "error").await;
            ClientOutcome::Continue
        }
        Ok(ClientMessage::Ping) => {
            let _ = send_event(socket, &json!({}), "pong").await;
            ClientOutcome::Continue
        }
        Ok(ClientMessage::Cancel) => {
            let _ = send_event(socket, &json!({"execution_id": execution_id}), "execution_cancelled").await;
            ClientOutcome::Continue
        }
        Ok(ClientMessage::Execute { plan }) => match start_run(socket, state, plan).await {
            Some(run) => ClientOutcome::Started(run),
            None => ClientOutcome::Continue,
        },
    }
}

async fn start_run(socket: &mut WebSocket, state: &AppState, plan_value: serde_json::Value) -> Option<InFlightRun> {
    let plan: Plan = match serde_json::from_value(plan_value) {
        Ok(p) => p,
        Err(e) => {
            let _ = send_event(socket, &json!({"code": "E1001", "message": e.to_string()}), "error").await;
            return None;
        }
    };

    let declared_step_ids: Vec<String> = plan.steps.iter().map(|s| s.id.as_str().to_string()).collect();
    let options = state.run_options();
    let handle = tokio::spawn(async move { run_plan(&plan, &options).await });

    Some(InFlightRun { declared_step_ids, handle })
}

async fn stream_result(
    socket: &mut WebSocket,
    declared_step_ids: &[String],
    result: Result<Result<RunnerResult, OrchestrateError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(result)) => {
            for event in events_for_report(declared_step_ids, &result.raw_report) {
                if send_raw_event(socket, &event).await.is_err() {
                    return;
                }
            }
        }
        Ok(Err(e)) => {
            let _ = send_event(socket, &json!({"code": "E5001", "message": e.to_string()}), "error").await;
        }
        Err(e) if e.is_cancelled() => {
            // aborted via a `cancel` message; `execution_cancelled` was already sent.
        }
        Err(e) => {
            let _ = send_event(socket, &json!({"code": "E5001", "message": e.to_string()}), "error").await;
        }
    }
}

async fn send_event(socket: &mut WebSocket, data: &serde_json::Value, event: &str) -> Result<(), axum::Error> {
    let mut payload = serde_json::Map::new();
    payload.insert("event".to_string(), json!(event));
    if let serde_json::Value::Object(map) = data {
        for (k, v) in map {
            payload.insert(k.clone(), v.clone());
        }
    }
    socket.send(Message::Text(serde_json::Value::Object(payload).to_string().into())).await
}

async fn send_raw_event(socket: &mut WebSocket, event: &ExecutionEvent) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(payload.into())).await
}

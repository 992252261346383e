//! The natural-language command endpoint.
//!
//! This is the external caller of the agent runtime: it persists an action
//! log row for every handled command and broadcasts each result to connected
//! observers. The runtime itself does neither.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::warn;

use kirana_agent::resolver::Resolution;
use kirana_agent::runtime::AgentRuntime;
use kirana_core::command::CommandResult;
use kirana_db::repositories::{ActionLogEntry, SqlActionLog};

#[derive(Clone)]
pub struct CommandState {
    pub runtime: Arc<AgentRuntime>,
    pub action_log: Arc<SqlActionLog>,
    pub events: broadcast::Sender<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CommandInput {
    pub text: String,
    #[serde(default = "default_conversation")]
    pub conversation_id: String,
    #[serde(default)]
    pub context: serde_json::Map<String, Value>,
}

fn default_conversation() -> String {
    "default".to_string()
}

pub fn router(state: CommandState) -> Router {
    Router::new()
        .route("/command", post(execute_command))
        .route("/command/confirm/{confirmation_id}", post(confirm_command))
        .with_state(state)
}

pub fn event_channel() -> broadcast::Sender<Value> {
    broadcast::channel(128).0
}

async fn execute_command(
    State(state): State<CommandState>,
    Json(input): Json<CommandInput>,
) -> Json<CommandResult> {
    state.runtime.merge_context(&input.conversation_id, input.context.clone()).await;
    let outcome = state.runtime.handle_command(&input.conversation_id, &input.text).await;

    let parsed_intent = match &outcome.resolution {
        Resolution::Intent(intent) => {
            serde_json::to_value(intent).unwrap_or_else(|_| json!({}))
        }
        Resolution::Plan(plan) => serde_json::to_value(plan).unwrap_or_else(|_| json!({})),
    };

    let all_succeeded = outcome.results.iter().all(|result| result.success);
    let (action_taken, status) = match &outcome.resolution {
        Resolution::Plan(_) => (
            "multi_step_plan".to_string(),
            if all_succeeded { "completed" } else { "partial" },
        ),
        Resolution::Intent(intent) => {
            (intent.action.clone(), if all_succeeded { "completed" } else { "failed" })
        }
    };

    let entry = ActionLogEntry {
        conversation_id: Some(input.conversation_id.clone()),
        user_input: input.text.clone(),
        parsed_intent,
        action_taken: Some(action_taken),
        status: Some(status.to_string()),
        result: serde_json::to_value(&outcome.results).ok(),
    };
    if let Err(error) = state.action_log.append(entry).await {
        warn!(
            event_name = "command.action_log_failed",
            error = %error,
            "failed to persist action log entry"
        );
    }

    for result in &outcome.results {
        broadcast_result(&state.events, result);
    }

    let last = outcome.results.into_iter().last().unwrap_or_else(|| {
        CommandResult::fail("error", "No actions executed")
    });
    Json(last)
}

async fn confirm_command(
    State(state): State<CommandState>,
    Path(confirmation_id): Path<String>,
) -> Json<CommandResult> {
    let result = state.runtime.confirm("default", &confirmation_id).await;
    broadcast_result(&state.events, &result);
    Json(result)
}

fn broadcast_result(events: &broadcast::Sender<Value>, result: &CommandResult) {
    // Nobody listening is fine; send only fails without receivers.
    let _ = events.send(json!({
        "type": "action_result",
        "action": result.action,
        "success": result.success,
        "message": result.message,
        "data": result.data,
    }));
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::Json;

    use kirana_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap_with_config;

    use super::{confirm_command, event_channel, execute_command, CommandInput, CommandState};

    async fn state(db_name: &str) -> CommandState {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(format!("sqlite:file:{db_name}?mode=memory&cache=shared")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config loads");

        let app = bootstrap_with_config(config).await.expect("bootstrap succeeds");
        CommandState { runtime: app.runtime, action_log: app.action_log, events: event_channel() }
    }

    #[tokio::test]
    async fn command_endpoint_executes_and_logs() {
        let state = state("kirana_cmd_exec").await;
        let mut events = state.events.subscribe();

        let Json(result) = execute_command(
            State(state.clone()),
            Json(CommandInput {
                text: "sab orders dikhao".to_string(),
                conversation_id: "conv-http".to_string(),
                context: Default::default(),
            }),
        )
        .await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.action, "list_orders");
        assert_eq!(state.action_log.count().await.expect("count"), 1);

        let event = events.try_recv().expect("one broadcast event");
        assert_eq!(event["action"], "list_orders");
    }

    #[tokio::test]
    async fn confirm_endpoint_rejects_unknown_tokens() {
        let state = state("kirana_cmd_confirm").await;

        let Json(result) =
            confirm_command(State(state), Path("not-a-token".to_string())).await;

        assert!(!result.success);
        assert_eq!(result.message, "Invalid or expired confirmation ID");
    }
}

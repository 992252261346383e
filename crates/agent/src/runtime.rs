use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use kirana_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use kirana_core::command::CommandResult;

use crate::context::ContextStore;
use crate::executor::ActionExecutor;
use crate::resolver::{IntentResolver, Resolution};

/// Everything one inbound command produced: the resolution and the result of
/// every executed step. The caller logs and broadcasts these; the runtime
/// itself only touches context and the audit sink.
#[derive(Clone, Debug)]
pub struct CommandOutcome {
    pub resolution: Resolution,
    pub results: Vec<CommandResult>,
}

impl CommandOutcome {
    pub fn last(&self) -> Option<&CommandResult> {
        self.results.last()
    }
}

pub struct AgentRuntime {
    resolver: IntentResolver,
    executor: ActionExecutor,
    context: Arc<ContextStore>,
    audit: Arc<dyn AuditSink>,
}

impl AgentRuntime {
    pub fn new(
        resolver: IntentResolver,
        executor: ActionExecutor,
        context: Arc<ContextStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { resolver, executor, context, audit }
    }

    /// Merge caller-supplied context (e.g. from the transport payload) into
    /// the conversation before resolving.
    pub async fn merge_context(
        &self,
        conversation_id: &str,
        values: serde_json::Map<String, Value>,
    ) {
        if !values.is_empty() {
            self.context.remember(conversation_id, values).await;
        }
    }

    pub async fn handle_command(&self, conversation_id: &str, text: &str) -> CommandOutcome {
        let correlation_id = Uuid::new_v4().to_string();

        self.audit.emit(
            AuditEvent::new(
                Some(conversation_id.to_string()),
                correlation_id.clone(),
                "command.received",
                AuditCategory::Ingress,
                "agent-runtime",
                AuditOutcome::Success,
            )
            .with_metadata("text_len", text.len().to_string()),
        );

        let context = self.context.snapshot(conversation_id).await;
        let resolution = self.resolver.resolve(text, &context).await;

        self.audit.emit(
            AuditEvent::new(
                Some(conversation_id.to_string()),
                correlation_id.clone(),
                "command.intent_resolved",
                AuditCategory::Resolution,
                "intent-resolver",
                AuditOutcome::Success,
            )
            .with_metadata("action", resolution.primary_action().to_string())
            .with_metadata("fallback", resolution.is_fallback().to_string()),
        );

        let results = match &resolution {
            Resolution::Intent(intent) => vec![self.executor.execute(intent, false).await],
            Resolution::Plan(plan) => self.executor.execute_plan(plan).await,
        };

        // Carry the touched entity forward so the next command can say
        // "that product" / "usko".
        if let Resolution::Intent(intent) = &resolution {
            if let Some(result) = results.last() {
                if result.success {
                    if let Some(id) =
                        result.data.as_ref().and_then(|data| data.get("id")).cloned()
                    {
                        let mut carried = vec![("last_entity_id".to_string(), id)];
                        if let Some(entity) = &intent.entity {
                            carried.push((
                                "last_entity_type".to_string(),
                                Value::String(entity.clone()),
                            ));
                        }
                        self.context.remember(conversation_id, carried).await;
                    }
                }
            }
        }

        for result in &results {
            self.audit.emit(
                AuditEvent::new(
                    Some(conversation_id.to_string()),
                    correlation_id.clone(),
                    "command.executed",
                    AuditCategory::Execution,
                    "action-executor",
                    if result.success { AuditOutcome::Success } else { AuditOutcome::Rejected },
                )
                .with_metadata("action", result.action.clone())
                .with_metadata("requires_confirmation", result.requires_confirmation.to_string()),
            );
        }

        CommandOutcome { resolution, results }
    }

    /// Confirm a previously parked intent by token.
    pub async fn confirm(&self, conversation_id: &str, token: &str) -> CommandResult {
        let result = self.executor.confirm(token).await;

        self.audit.emit(
            AuditEvent::new(
                Some(conversation_id.to_string()),
                Uuid::new_v4().to_string(),
                "command.confirmed",
                AuditCategory::Execution,
                "action-executor",
                if result.success { AuditOutcome::Success } else { AuditOutcome::Rejected },
            )
            .with_metadata("action", result.action.clone()),
        );

        result
    }
}

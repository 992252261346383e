use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One user-requested operation as produced by the intent resolver.
///
/// `action` is a tag from the fixed catalogue (see `catalog`); `parameters`
/// is the loosely-typed bag the resolver extracted. Typed validation happens
/// exactly once, at the executor boundary, when the intent is decoded into a
/// `CommandAction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIntent {
    pub action: String,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default)]
    pub confirmation_message: Option<String>,
    /// True when the rule-based fallback produced this intent, so callers can
    /// tell degraded resolutions apart from language-model output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl ResolvedIntent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            entity: None,
            parameters: Map::new(),
            requires_confirmation: false,
            confirmation_message: None,
            fallback: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut intent = Self::new("error");
        intent.parameters.insert("error".to_string(), Value::String(message.into()));
        intent
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Running,
    Completed,
    Halted,
}

/// An ordered sequence of intents derived from a single utterance. Later
/// steps may depend on identifiers earlier steps put into conversational
/// context, so execution is strictly sequential.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiStepPlan {
    pub steps: Vec<ResolvedIntent>,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default = "MultiStepPlan::default_status")]
    pub status: PlanStatus,
}

impl MultiStepPlan {
    pub fn new(steps: Vec<ResolvedIntent>) -> Self {
        Self { steps, current_step: 0, status: PlanStatus::Pending }
    }

    fn default_status() -> PlanStatus {
        PlanStatus::Pending
    }
}

/// The uniform return shape for every operation in the system. Callers only
/// branch on these fields, never on types, and no operation raises past it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub action: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_id: Option<String>,
}

impl CommandResult {
    pub fn ok(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            action: action.into(),
            message: message.into(),
            data: None,
            requires_confirmation: false,
            confirmation_id: None,
        }
    }

    pub fn ok_with_data(
        action: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self { data: Some(data), ..Self::ok(action, message) }
    }

    pub fn fail(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.into(),
            message: message.into(),
            data: None,
            requires_confirmation: false,
            confirmation_id: None,
        }
    }

    pub fn fail_with_data(
        action: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self { data: Some(data), ..Self::fail(action, message) }
    }

    /// A soft pause: the action is held behind a single-use token and nothing
    /// has been executed yet.
    pub fn awaiting_confirmation(
        action: impl Into<String>,
        message: impl Into<String>,
        confirmation_id: impl Into<String>,
    ) -> Self {
        Self {
            requires_confirmation: true,
            confirmation_id: Some(confirmation_id.into()),
            ..Self::fail(action, message)
        }
    }

    /// A policy rejection that can be retried with a `force` override. Unlike
    /// `awaiting_confirmation` there is no token; the caller re-issues the
    /// command with force set.
    pub fn policy_rejection(
        action: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self { requires_confirmation: true, ..Self::fail_with_data(action, message, data) }
    }

    pub fn is_hard_failure(&self) -> bool {
        !self.success && !self.requires_confirmation
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CommandResult, MultiStepPlan, PlanStatus, ResolvedIntent};

    #[test]
    fn error_intent_carries_diagnostic_parameter() {
        let intent = ResolvedIntent::error("backend unreachable");
        assert_eq!(intent.action, "error");
        assert_eq!(intent.param("error"), Some(&json!("backend unreachable")));
    }

    #[test]
    fn plan_decodes_from_llm_shape_with_defaults() {
        let plan: MultiStepPlan = serde_json::from_value(json!({
            "steps": [
                {"action": "create_product", "entity": "product", "parameters": {"name": "Chai", "price": 20}},
                {"action": "restock_product", "parameters": {"quantity": 50}}
            ]
        }))
        .expect("plan should decode");

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.current_step, 0);
        assert_eq!(plan.status, PlanStatus::Pending);
        assert_eq!(plan.steps[0].action, "create_product");
        assert!(!plan.steps[1].requires_confirmation);
    }

    #[test]
    fn hard_failure_excludes_confirmation_pauses() {
        assert!(CommandResult::fail("get_order", "Order 9 not found").is_hard_failure());
        assert!(!CommandResult::awaiting_confirmation("delete_product", "sure?", "token-1")
            .is_hard_failure());
        assert!(!CommandResult::ok("list_orders", "Found 0 orders").is_hard_failure());
    }

    #[test]
    fn fallback_marker_is_omitted_when_false() {
        let rendered =
            serde_json::to_string(&ResolvedIntent::new("list_orders")).expect("serialize");
        assert!(!rendered.contains("fallback"));

        let mut degraded = ResolvedIntent::new("list_orders");
        degraded.fallback = true;
        let rendered = serde_json::to_string(&degraded).expect("serialize");
        assert!(rendered.contains("\"fallback\":true"));
    }
}

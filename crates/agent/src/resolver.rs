use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::warn;

use kirana_core::command::{MultiStepPlan, ResolvedIntent};

use crate::fallback::PatternResolver;
use crate::llm::LlmClient;

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Intent(ResolvedIntent),
    Plan(MultiStepPlan),
}

impl Resolution {
    pub fn primary_action(&self) -> &str {
        match self {
            Self::Intent(intent) => &intent.action,
            Self::Plan(plan) => {
                plan.steps.first().map(|step| step.action.as_str()).unwrap_or("error")
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        match self {
            Self::Intent(intent) => intent.fallback,
            Self::Plan(plan) => plan.steps.iter().any(|step| step.fallback),
        }
    }
}

/// Turns user text plus conversational context into a catalogue action or an
/// ordered plan. Total: every failure mode degrades, first to the pattern
/// fallback and finally to an `action = "error"` intent. Nothing propagates
/// to the caller as an error.
pub struct IntentResolver {
    llm: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
    fallback: PatternResolver,
}

impl IntentResolver {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, timeout: Duration) -> Self {
        Self { llm, timeout, fallback: PatternResolver::new() }
    }

    /// Fallback-only resolver, used when no language-model backend is
    /// configured.
    pub fn rule_based() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    pub async fn resolve(&self, text: &str, context: &Map<String, Value>) -> Resolution {
        if let Some(llm) = &self.llm {
            let prompt = build_prompt(text, context);
            // A timeout is treated exactly like a backend exception: fall
            // through to the rule-based path.
            match tokio::time::timeout(self.timeout, llm.complete(&prompt)).await {
                Ok(Ok(response)) => match parse_response(&response) {
                    Some(resolution) => return resolution,
                    None => {
                        warn!(
                            event_name = "resolver.llm_unparseable",
                            response_len = response.len(),
                            "language model returned unparseable output, using fallback"
                        );
                    }
                },
                Ok(Err(error)) => {
                    warn!(
                        event_name = "resolver.llm_error",
                        error = %error,
                        "language model call failed, using fallback"
                    );
                }
                Err(_) => {
                    warn!(
                        event_name = "resolver.llm_timeout",
                        timeout_secs = self.timeout.as_secs(),
                        "language model call timed out, using fallback"
                    );
                }
            }
        }

        match self.fallback.resolve(text) {
            Some(intent) => Resolution::Intent(intent),
            None => {
                let mut intent =
                    ResolvedIntent::error(format!("Could not understand command: {text}"));
                intent.fallback = true;
                Resolution::Intent(intent)
            }
        }
    }
}

/// Catalogue description and routing rules handed to the language model.
/// The model only translates; routing decisions (like shop creation going
/// through the verification form) are spelled out here.
const SYSTEM_PROMPT: &str = r#"You are an intent parser for a marketplace command system.
Parse natural language commands (English, Hindi, or Hinglish) into structured JSON actions.

Available actions:

=== PRODUCT COMMANDS (Shop Admin only) ===
- create_product: Create a new product (params: name, price, description?, quantity?, cost_price?, min_price?, sku?)
- update_product: Update a product (params: product_id, name?, price?, quantity?, description?)
- delete_product: Delete a product (params: product_id)
- list_products: List all products (params: shop_id?, search?)
- get_product: Get a specific product (params: product_id or name)
- search_products: Search products (params: query, limit?)
- get_low_stock: Get low stock products (params: shop_id?)
- restock_product: Add stock to a product (params: product_id, quantity)
- set_product_price: Update product price (params: product_id, price)

=== ORDER COMMANDS (Shop Admin) ===
- list_orders: List all orders (params: status?, shop_id?)
- get_order: Get a specific order (params: order_id)
- confirm_order: Confirm a pending order (params: order_id)
- ship_order: Mark order as shipped (params: order_id, tracking_number?)
- deliver_order: Mark order as delivered (params: order_id)
- cancel_order: Cancel an order (params: order_id)
- refund_order: Process refund for order (params: order_id, reason?)

=== CUSTOMER ORDER COMMANDS (Customer) ===
- place_order: Place a new order (params: product_id, quantity)
- list_my_orders: List customer's own orders (params: customer_email?)
- update_order: Update order quantity (params: order_id, quantity)

=== CUSTOMER MANAGEMENT (Shop Admin) ===
- list_customers: List all customers (params: none)
- get_customer: Get a specific customer (params: customer_id or email)
- search_customers: Search customers by name or email (params: query)

=== SHOP COMMANDS (Super Admin) ===
- prefill_shop_form: Pre-fill shop registration form - use when user says "add shop", "create shop", "register shop"
  (params: name?, description?, category_id?, owner_name?, owner_email?, owner_phone?, address?, city?, pincode?, gst_number?)
- update_shop: Update shop details (params: shop_id, name?, description?, address?, city?, pincode?)
- delete_shop: Delete a shop (params: shop_id)
- list_shops: List all shops (params: category_id?, city?, search?, is_verified?, is_active?)
- get_shop: Get shop details and stats (params: shop_id or name)
- verify_shop: Verify/approve a pending shop (params: shop_id or name)
- suspend_shop: Suspend a shop (params: shop_id or name)
- activate_shop: Activate a suspended shop (params: shop_id or name)
- get_pending_shops: Get all shops pending verification (params: none)

=== SHOP DASHBOARD COMMANDS (Shop Admin) ===
- get_shop_dashboard: Get shop dashboard stats (params: shop_id)
- get_shop_low_stock: Get low stock products for shop (params: shop_id)
- get_shop_orders: Get shop orders (params: shop_id, status?)

=== USER COMMANDS (Super Admin) ===
- list_users: List all users (params: role?)
- get_user: Get user details (params: user_id or email)

=== PLATFORM COMMANDS (Super Admin) ===
- get_platform_stats: Get platform-wide statistics (params: none)

=== CATEGORY COMMANDS ===
- list_shop_categories: List shop categories (params: none)
- create_shop_category: Create shop category (params: name, description?, icon?)

=== BILLING & PROFIT COMMANDS (Shop Admin) ===
- sell_at_price: Sell product at bargained price (params: product_id, price, quantity?, customer_name?, customer_phone?, force?)
- generate_bill: Generate bill for order (params: order_id, bill_type: "customer"|"admin")
- get_daily_profit: Get daily profit report (params: shop_id, date?)
- get_product_profit: Get profit report by product (params: shop_id)
- get_profit_summary: Get overall profit summary (params: shop_id)

Rules:
1. Output ONLY valid JSON, no markdown or explanation
2. For destructive actions (delete, cancel, refund, suspend), set requires_confirmation: true
3. When user says "add shop", "create shop", "register shop" -> use prefill_shop_form (NOT create_shop)
4. When user says "approve" or "verify" a shop -> use verify_shop
5. When user says "pending shops" -> use get_pending_shops
6. When user says "show my orders", "my orders", "mere orders" -> use list_my_orders
7. When user says "buy", "order", "purchase", "kharido" a product -> use place_order
8. When user says "show dashboard", "my stats" -> use get_shop_dashboard
9. When user says "sell at", "sell for", "becho" -> use sell_at_price
10. When user says "generate bill", "bill banao", "print bill" -> use generate_bill
11. When user says "today's profit", "aaj ka profit", "daily profit" -> use get_daily_profit
12. When user says "profit summary", "my profit", "mera profit" -> use get_profit_summary
13. For admin bill (with profit info), set bill_type: "admin". For customer bill, set bill_type: "customer"
14. Use conversational context to resolve references like "that product" or "usko"

Output format for single action:
{"action": "action_name", "entity": "product|order|shop|user|category", "parameters": {...}, "requires_confirmation": false}

Output format for multi-step:
{"steps": [{"action": "...", "entity": "...", "parameters": {...}}, ...]}"#;

fn build_prompt(text: &str, context: &Map<String, Value>) -> String {
    let context_block = if context.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nContext from previous interactions:\n{}",
            Value::Object(context.clone())
        )
    };

    format!("{SYSTEM_PROMPT}{context_block}\n\nUser command: {text}\n\nJSON output:")
}

/// Decode the model's reply, tolerating an optional fenced code block.
fn parse_response(response: &str) -> Option<Resolution> {
    let stripped = strip_code_fences(response);
    let value: Value = serde_json::from_str(stripped).ok()?;

    if value.get("steps").is_some_and(Value::is_array) {
        let plan: MultiStepPlan = serde_json::from_value(value).ok()?;
        if plan.steps.is_empty() {
            return None;
        }
        return Some(Resolution::Plan(plan));
    }

    let intent: ResolvedIntent = serde_json::from_value(value).ok()?;
    Some(Resolution::Intent(intent))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    use crate::llm::LlmClient;

    use super::{strip_code_fences, IntentResolver, Resolution};

    struct ScriptedLlm(String);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("rate limited"))
        }
    }

    struct HangingLlm;

    #[async_trait]
    impl LlmClient for HangingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn resolver_with(llm: impl LlmClient + 'static) -> IntentResolver {
        IntentResolver::new(Some(Arc::new(llm)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn parses_plain_json_response() {
        let resolver = resolver_with(ScriptedLlm(
            json!({
                "action": "get_order",
                "entity": "order",
                "parameters": {"order_id": 12},
                "requires_confirmation": false
            })
            .to_string(),
        ));

        let resolution = resolver.resolve("show order 12", &Map::new()).await;
        let Resolution::Intent(intent) = resolution else {
            panic!("expected single intent");
        };
        assert_eq!(intent.action, "get_order");
        assert!(!intent.fallback);
    }

    #[tokio::test]
    async fn strips_fenced_code_blocks() {
        let payload = json!({"action": "list_products", "entity": "product", "parameters": {}});
        let resolver =
            resolver_with(ScriptedLlm(format!("```json\n{payload}\n```")));

        let resolution = resolver.resolve("list products", &Map::new()).await;
        assert_eq!(resolution.primary_action(), "list_products");
        assert!(!resolution.is_fallback());
    }

    #[tokio::test]
    async fn steps_array_materializes_a_plan() {
        let resolver = resolver_with(ScriptedLlm(
            json!({
                "steps": [
                    {"action": "create_product", "entity": "product",
                     "parameters": {"name": "Chai", "price": 20}},
                    {"action": "restock_product", "entity": "product",
                     "parameters": {"product_id": 1, "quantity": 50}}
                ]
            })
            .to_string(),
        ));

        let resolution = resolver.resolve("add chai and stock it", &Map::new()).await;
        let Resolution::Plan(plan) = resolution else {
            panic!("expected plan");
        };
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].action, "restock_product");
    }

    #[tokio::test]
    async fn malformed_output_falls_back_to_patterns() {
        let resolver = resolver_with(ScriptedLlm("sure! here's what I'd do:".to_string()));

        let resolution = resolver.resolve("sab orders dikhao", &Map::new()).await;
        assert_eq!(resolution.primary_action(), "list_orders");
        assert!(resolution.is_fallback());
    }

    #[tokio::test]
    async fn backend_error_falls_back_to_patterns() {
        let resolver = resolver_with(FailingLlm);

        let resolution = resolver.resolve("sab orders dikhao", &Map::new()).await;
        assert_eq!(resolution.primary_action(), "list_orders");
        assert!(resolution.is_fallback());
    }

    #[tokio::test]
    async fn timeout_is_treated_like_a_backend_error() {
        let resolver = IntentResolver::new(Some(Arc::new(HangingLlm)), Duration::from_millis(50));

        let resolution = resolver.resolve("sab orders dikhao", &Map::new()).await;
        assert_eq!(resolution.primary_action(), "list_orders");
        assert!(resolution.is_fallback());
    }

    #[tokio::test]
    async fn both_paths_failing_yields_an_error_intent() {
        let resolver = resolver_with(FailingLlm);

        let resolution = resolver.resolve("xyzzy plugh", &Map::new()).await;
        let Resolution::Intent(intent) = resolution else {
            panic!("expected intent");
        };
        assert_eq!(intent.action, "error");
        assert!(intent.param("error").is_some());
    }

    #[tokio::test]
    async fn empty_plans_are_rejected_as_unparseable() {
        let resolver = resolver_with(ScriptedLlm(json!({"steps": []}).to_string()));

        let resolution = resolver.resolve("sab orders dikhao", &Map::new()).await;
        assert_eq!(resolution.primary_action(), "list_orders");
        assert!(resolution.is_fallback());
    }

    #[test]
    fn fence_stripping_handles_all_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```json\n{\"a\":1}\n```  "), "{\"a\":1}");
    }
}

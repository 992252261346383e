//! End-to-end command flows over the in-memory stores: the confirmation
//! state machine, plan short-circuiting, bargained-sale policy, bill views,
//! and snapshot immutability.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;

use kirana_agent::confirm::PendingConfirmationStore;
use kirana_agent::context::ContextStore;
use kirana_agent::executor::{ActionExecutor, StoreSet};
use kirana_agent::resolver::IntentResolver;
use kirana_agent::runtime::AgentRuntime;
use kirana_core::audit::InMemoryAuditSink;
use kirana_core::command::{MultiStepPlan, ResolvedIntent};
use kirana_core::domain::product::ProductId;
use kirana_core::stores::{NewProduct, ProductStore};
use kirana_db::repositories::{
    InMemoryCategoryStore, InMemoryCustomerStore, InMemoryOrderStore, InMemoryProductStore,
    InMemoryShopStore, InMemoryUserStore,
};

struct Harness {
    products: InMemoryProductStore,
    executor: ActionExecutor,
}

fn rupees(value: i64) -> Decimal {
    Decimal::from(value)
}

fn harness() -> Harness {
    let products = InMemoryProductStore::default();
    let orders = InMemoryOrderStore::new(products.clone());
    let stores = StoreSet {
        products: Arc::new(products.clone()),
        orders: Arc::new(orders),
        shops: Arc::new(InMemoryShopStore::default()),
        customers: Arc::new(InMemoryCustomerStore::default()),
        users: Arc::new(InMemoryUserStore::default()),
        categories: Arc::new(InMemoryCategoryStore::default()),
    };
    let executor = ActionExecutor::new(stores, Arc::new(PendingConfirmationStore::default()));
    Harness { products, executor }
}

async fn seed_product(
    harness: &Harness,
    price: i64,
    cost: Option<i64>,
    min_price: Option<i64>,
    quantity: u32,
) -> ProductId {
    harness
        .products
        .create(NewProduct {
            name: "Mixer Grinder".to_string(),
            price: rupees(price),
            cost_price: cost.map(rupees),
            min_price: min_price.map(rupees),
            quantity,
            min_stock_level: 2,
            ..NewProduct::default()
        })
        .await
        .expect("seed product")
        .id
}

fn intent(action: &str, params: serde_json::Value) -> ResolvedIntent {
    let mut intent = ResolvedIntent::new(action);
    intent.parameters = params.as_object().expect("params object").clone();
    intent
}

fn destructive(action: &str, params: serde_json::Value) -> ResolvedIntent {
    let mut intent = intent(action, params);
    intent.requires_confirmation = true;
    intent
}

#[tokio::test]
async fn confirmation_gate_holds_the_action_and_tokens_are_single_use() {
    let harness = harness();
    let product_id = seed_product(&harness, 100, None, None, 5).await;

    let delete = destructive("delete_product", json!({"product_id": product_id.0}));
    let paused = harness.executor.execute(&delete, false).await;

    assert!(!paused.success);
    assert!(paused.requires_confirmation);
    let token = paused.confirmation_id.clone().expect("token issued");

    // Nothing happened yet.
    assert!(harness.products.get(product_id).await.expect("get").is_some());

    let executed = harness.executor.confirm(&token).await;
    assert!(executed.success, "confirm should run the held intent: {}", executed.message);
    assert!(harness.products.get(product_id).await.expect("get").is_none());

    let replayed = harness.executor.confirm(&token).await;
    assert!(!replayed.success);
    assert_eq!(replayed.message, "Invalid or expired confirmation ID");
}

#[tokio::test]
async fn fresh_tokens_are_issued_per_gate_hit() {
    let harness = harness();
    let product_id = seed_product(&harness, 100, None, None, 5).await;
    let delete = destructive("delete_product", json!({"product_id": product_id.0}));

    let first = harness.executor.execute(&delete, false).await;
    let second = harness.executor.execute(&delete, false).await;

    assert_ne!(first.confirmation_id, second.confirmation_id);
}

#[tokio::test]
async fn plan_halts_at_first_hard_failure() {
    let harness = harness();

    let plan = MultiStepPlan::new(vec![
        intent("create_product", json!({"name": "Chai Patti", "price": 120, "quantity": 10})),
        intent("get_product", json!({"product_id": 999})),
        intent("create_product", json!({"name": "Sugar", "price": 45, "quantity": 10})),
    ]);

    let results = harness.executor.execute_plan(&plan).await;

    assert_eq!(results.len(), 2, "third step must not run");
    assert!(results[0].success);
    assert!(results[1].is_hard_failure());

    let products = harness.products.list(None).await.expect("list");
    assert_eq!(products.len(), 1, "no side effects from the unexecuted step");
}

#[tokio::test]
async fn plan_pauses_but_continues_past_confirmation_steps() {
    let harness = harness();
    let product_id = seed_product(&harness, 100, None, None, 5).await;

    let plan = MultiStepPlan::new(vec![
        destructive("delete_product", json!({"product_id": product_id.0})),
        intent("list_products", json!({})),
    ]);

    let results = harness.executor.execute_plan(&plan).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].requires_confirmation);
    assert!(results[1].success);
    // The gated delete never ran.
    assert!(harness.products.get(product_id).await.expect("get").is_some());
}

#[tokio::test]
async fn below_min_price_soft_fails_then_proceeds_with_force() {
    let harness = harness();
    let product_id = seed_product(&harness, 150, Some(80), Some(100), 10).await;

    let rejected = harness
        .executor
        .execute(
            &intent("sell_at_price", json!({"product_id": product_id.0, "price": 90})),
            false,
        )
        .await;

    assert!(!rejected.success);
    assert!(rejected.requires_confirmation);
    let data = rejected.data.expect("rejection data");
    assert_eq!(data["confirmation_type"], json!("below_min_price"));
    assert_eq!(data["min_price"], json!("100"));

    let forced = harness
        .executor
        .execute(
            &intent(
                "sell_at_price",
                json!({"product_id": product_id.0, "price": 90, "force": true}),
            ),
            false,
        )
        .await;

    assert!(forced.success, "{}", forced.message);
    let data = forced.data.expect("sale data");
    assert_eq!(data["sold_at"], json!("90"));
    assert_eq!(data["profit"], json!("10"));

    let product = harness.products.get(product_id).await.expect("get").expect("present");
    assert_eq!(product.quantity, 9);
    assert_eq!(product.sold_count, 1);
}

#[tokio::test]
async fn selling_at_loss_reports_the_per_unit_loss() {
    let harness = harness();
    let product_id = seed_product(&harness, 120, Some(100), None, 10).await;

    let rejected = harness
        .executor
        .execute(
            &intent("sell_at_price", json!({"product_id": product_id.0, "price": 80})),
            false,
        )
        .await;

    assert!(!rejected.success);
    assert!(rejected.requires_confirmation);
    let data = rejected.data.expect("rejection data");
    assert_eq!(data["confirmation_type"], json!("selling_at_loss"));
    assert_eq!(data["loss_per_unit"], json!("20"));
}

#[tokio::test]
async fn customer_and_admin_bills_expose_different_fields() {
    let harness = harness();
    let product_id = seed_product(&harness, 150, Some(80), None, 10).await;

    let sale = harness
        .executor
        .execute(
            &intent(
                "sell_at_price",
                json!({"product_id": product_id.0, "price": 120, "quantity": 2}),
            ),
            false,
        )
        .await;
    assert!(sale.success, "{}", sale.message);
    let order_id = sale.data.expect("sale data")["order_id"].as_i64().expect("order id");

    let customer = harness
        .executor
        .execute(&intent("generate_bill", json!({"order_id": order_id})), false)
        .await;
    assert!(customer.success);
    let rendered = customer.data.expect("customer bill").to_string();
    assert!(!rendered.contains("cost_price"));
    assert!(!rendered.contains("profit"));

    let admin = harness
        .executor
        .execute(
            &intent("generate_bill", json!({"order_id": order_id, "bill_type": "admin"})),
            false,
        )
        .await;
    assert!(admin.success);
    let bill = admin.data.expect("admin bill");
    let summary = &bill["summary"];
    // profit = total_amount - total_cost = 240 - 160
    assert_eq!(summary["total_profit"], json!("80"));
    assert_eq!(summary["subtotal"], json!("240"));
    assert_eq!(summary["total_cost"], json!("160"));
}

#[tokio::test]
async fn unknown_actions_fail_without_raising() {
    let harness = harness();
    let result =
        harness.executor.execute(&intent("drop_all_tables", json!({})), false).await;

    assert!(!result.success);
    assert!(!result.requires_confirmation);
    assert!(result.message.contains("Unknown action"));
}

#[tokio::test]
async fn missing_parameters_name_the_parameter() {
    let harness = harness();
    let result = harness
        .executor
        .execute(&intent("sell_at_price", json!({"product_id": 1})), false)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Missing required parameter: price");
}

#[tokio::test]
async fn later_price_changes_never_rewrite_past_orders() {
    let harness = harness();
    let product_id = seed_product(&harness, 150, Some(80), None, 10).await;

    let sale = harness
        .executor
        .execute(
            &intent("sell_at_price", json!({"product_id": product_id.0, "price": 120})),
            false,
        )
        .await;
    assert!(sale.success);
    let order_id = sale.data.expect("sale data")["order_id"].as_i64().expect("order id");

    let repriced = harness
        .executor
        .execute(
            &intent("set_product_price", json!({"product_id": product_id.0, "price": 999})),
            false,
        )
        .await;
    assert!(repriced.success);

    let admin = harness
        .executor
        .execute(
            &intent("generate_bill", json!({"order_id": order_id, "bill_type": "admin"})),
            false,
        )
        .await;
    let bill = admin.data.expect("admin bill");
    assert_eq!(bill["items"][0]["mrp"], json!("150"), "snapshot keeps the MRP at sale time");
    assert_eq!(bill["items"][0]["sold_at"], json!("120"));
    assert_eq!(bill["summary"]["total_profit"], json!("40"));
}

#[tokio::test]
async fn runtime_resolves_hinglish_through_fallback_and_executes() {
    let harness = harness();
    seed_product(&harness, 100, None, None, 3).await;

    let runtime = AgentRuntime::new(
        IntentResolver::rule_based(),
        harness.executor,
        Arc::new(ContextStore::default()),
        Arc::new(InMemoryAuditSink::default()),
    );

    let outcome = runtime.handle_command("conv-1", "sab orders dikhao").await;

    assert!(outcome.resolution.is_fallback());
    assert_eq!(outcome.results.len(), 1);
    let result = outcome.last().expect("one result");
    assert!(result.success, "{}", result.message);
    assert_eq!(result.action, "list_orders");
}

#[tokio::test]
async fn runtime_carries_last_entity_into_context() {
    let harness = harness();
    let product_id = seed_product(&harness, 100, None, None, 3).await;

    let context = Arc::new(ContextStore::new(Duration::from_secs(3600)));
    let audit = Arc::new(InMemoryAuditSink::default());
    let runtime = AgentRuntime::new(
        IntentResolver::rule_based(),
        harness.executor,
        context.clone(),
        audit.clone(),
    );

    let outcome =
        runtime.handle_command("conv-7", &format!("product {product_id} order karo")).await;

    let result = outcome.last().expect("one result");
    assert!(result.success, "{}", result.message);
    assert_eq!(result.action, "place_order");

    let snapshot = context.snapshot("conv-7").await;
    assert!(snapshot.contains_key("last_entity_id"));
    assert_eq!(snapshot.get("last_entity_type"), Some(&serde_json::json!("order")));

    assert!(!audit.events().is_empty());
}

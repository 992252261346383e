use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use kirana_agent::confirm::PendingConfirmationStore;
use kirana_agent::context::ContextStore;
use kirana_agent::executor::{ActionExecutor, StoreSet};
use kirana_agent::llm::{call_timeout, client_from_config};
use kirana_agent::resolver::IntentResolver;
use kirana_agent::runtime::AgentRuntime;
use kirana_core::audit::{AuditEvent, AuditSink};
use kirana_core::config::{AppConfig, ConfigError, LoadOptions};
use kirana_db::repositories::{
    SqlActionLog, SqlCategoryStore, SqlCustomerStore, SqlOrderStore, SqlProductStore,
    SqlShopStore, SqlUserStore,
};
use kirana_db::{connect_with_settings, migrations, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
    pub action_log: Arc<SqlActionLog>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Audit events flow into structured logs; the append-only action log table
/// is written separately by the command endpoint.
struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            conversation_id = event.conversation_id.as_deref().unwrap_or("unknown"),
            actor = %event.actor,
            outcome = ?event.outcome,
            "audit event"
        );
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let stores = StoreSet {
        products: Arc::new(SqlProductStore::new(db_pool.clone())),
        orders: Arc::new(SqlOrderStore::new(db_pool.clone())),
        shops: Arc::new(SqlShopStore::new(db_pool.clone())),
        customers: Arc::new(SqlCustomerStore::new(db_pool.clone())),
        users: Arc::new(SqlUserStore::new(db_pool.clone())),
        categories: Arc::new(SqlCategoryStore::new(db_pool.clone())),
    };

    let executor = ActionExecutor::new(stores, Arc::new(PendingConfirmationStore::default()));

    let llm = client_from_config(&config.llm);
    info!(
        event_name = "system.bootstrap.resolver_mode",
        correlation_id = "bootstrap",
        mode = if llm.is_some() { "llm_with_fallback" } else { "fallback_only" },
        "intent resolver initialized"
    );
    let resolver = IntentResolver::new(llm, call_timeout(&config.llm));

    let runtime = Arc::new(AgentRuntime::new(
        resolver,
        executor,
        Arc::new(ContextStore::default()),
        Arc::new(TracingAuditSink),
    ));

    Ok(Application {
        config,
        db_pool: db_pool.clone(),
        runtime,
        action_log: Arc::new(SqlActionLog::new(db_pool)),
    })
}

#[cfg(test)]
mod tests {
    use kirana_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(
                    "sqlite:file:kirana_bootstrap?mode=memory&cache=shared".to_string(),
                ),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_runs_migrations_and_builds_the_runtime() {
        let app = bootstrap(memory_options()).await.expect("bootstrap succeeds");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('products', 'orders', 'shops', 'action_log')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables present");
        assert_eq!(table_count, 4);

        // Without an API key the resolver still answers through the fallback.
        let outcome = app.runtime.handle_command("conv-boot", "sab orders dikhao").await;
        let result = outcome.last().expect("one result");
        assert!(result.success, "{}", result.message);
        assert_eq!(result.action, "list_orders");

        app.db_pool.close().await;
    }
}

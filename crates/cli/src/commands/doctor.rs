use serde::Serialize;

use crate::commands::CommandResult;
use kirana_core::config::{AppConfig, LoadOptions};
use kirana_db::connect_with_settings;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: &'static str,
    checks: Vec<DoctorCheck>,
}

pub fn run(json: bool) -> CommandResult {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "ok",
                detail: "configuration loaded and validated".to_string(),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "failed",
                detail: error.to_string(),
            });
            None
        }
    };

    if let Some(config) = &config {
        checks.push(llm_check(config));
        checks.push(database_check(config));
    }

    let healthy = checks.iter().all(|check| check.status != "failed");
    let report = DoctorReport { status: if healthy { "ready" } else { "degraded" }, checks };

    let output = if json {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"error\": \"{error}\"}}"))
    } else {
        let mut lines = vec![format!("doctor: {}", report.status)];
        for check in &report.checks {
            lines.push(format!("- {}: {} ({})", check.name, check.status, check.detail));
        }
        lines.join("\n")
    };

    CommandResult { exit_code: if healthy { 0 } else { 1 }, output }
}

fn llm_check(config: &AppConfig) -> DoctorCheck {
    match (&config.llm.provider, &config.llm.api_key, &config.llm.base_url) {
        (kirana_core::config::LlmProvider::Gemini, Some(_), _) => DoctorCheck {
            name: "llm",
            status: "ok",
            detail: format!("gemini configured with model {}", config.llm.model),
        },
        (kirana_core::config::LlmProvider::Gemini, None, _) => DoctorCheck {
            name: "llm",
            status: "warn",
            detail: "no API key set; intent resolution will run fallback-only".to_string(),
        },
        (kirana_core::config::LlmProvider::Ollama, _, Some(base_url)) => DoctorCheck {
            name: "llm",
            status: "ok",
            detail: format!("ollama configured at {base_url}"),
        },
        (kirana_core::config::LlmProvider::Ollama, _, None) => DoctorCheck {
            name: "llm",
            status: "failed",
            detail: "ollama provider requires llm.base_url".to_string(),
        },
    }
}

fn database_check(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database",
                status: "failed",
                detail: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await?;
        sqlx_ping(&pool).await?;
        pool.close().await;
        Ok::<(), sqlx::Error>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database",
            status: "ok",
            detail: "connection and query succeeded".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "database",
            status: "failed",
            detail: error.to_string(),
        },
    }
}

async fn sqlx_ping(pool: &kirana_db::DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await.map(|_| ())
}

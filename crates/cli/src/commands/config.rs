use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kirana_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut render = |key_path: &str, env_key: &str, value: String| {
        lines.push(render_line(
            key_path,
            &value,
            field_source(
                key_path,
                Some(env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    };

    render("database.url", "KIRANA_DATABASE_URL", config.database.url.clone());
    render(
        "database.max_connections",
        "KIRANA_DATABASE_MAX_CONNECTIONS",
        config.database.max_connections.to_string(),
    );
    render(
        "database.timeout_secs",
        "KIRANA_DATABASE_TIMEOUT_SECS",
        config.database.timeout_secs.to_string(),
    );
    render("llm.provider", "KIRANA_LLM_PROVIDER", format!("{:?}", config.llm.provider));
    render("llm.model", "KIRANA_LLM_MODEL", config.llm.model.clone());
    render(
        "llm.base_url",
        "KIRANA_LLM_BASE_URL",
        config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
    );
    render(
        "llm.api_key",
        "KIRANA_LLM_API_KEY",
        if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" }.to_string(),
    );
    render("llm.timeout_secs", "KIRANA_LLM_TIMEOUT_SECS", config.llm.timeout_secs.to_string());
    render(
        "server.bind_address",
        "KIRANA_SERVER_BIND_ADDRESS",
        config.server.bind_address.clone(),
    );
    render("server.port", "KIRANA_SERVER_PORT", config.server.port.to_string());
    render("logging.level", "KIRANA_LOGGING_LEVEL", config.logging.level.clone());
    render("logging.format", "KIRANA_LOGGING_FORMAT", format!("{:?}", config.logging.format));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("kirana.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/kirana.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

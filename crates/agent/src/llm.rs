use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use kirana_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.expose_secret()
        );

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": 0.0}
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?
            .error_for_status()
            .context("gemini returned an error status")?;

        let payload: Value = response.json().await.context("gemini response was not json")?;
        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("gemini response carried no candidate text"))?;

        Ok(text.to_string())
    }
}

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), model: model.into() }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = json!({"model": self.model, "prompt": prompt, "stream": false});

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?
            .error_for_status()
            .context("ollama returned an error status")?;

        let payload: Value = response.json().await.context("ollama response was not json")?;
        let text = payload
            .get("response")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("ollama response carried no text"))?;

        Ok(text.to_string())
    }
}

/// Build a client from config. Returns `None` when the configured provider
/// cannot be used (e.g. Gemini without an API key); the resolver then runs
/// fallback-only.
pub fn client_from_config(config: &LlmConfig) -> Option<Arc<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Gemini => {
            let api_key = config.api_key.clone()?;
            let mut client = GeminiClient::new(api_key, config.model.clone());
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Some(Arc::new(client))
        }
        LlmProvider::Ollama => {
            let base_url = config.base_url.clone()?;
            Some(Arc::new(OllamaClient::new(base_url, config.model.clone())))
        }
    }
}

pub fn call_timeout(config: &LlmConfig) -> Duration {
    Duration::from_secs(config.timeout_secs.max(1))
}

#[cfg(test)]
mod tests {
    use kirana_core::config::{LlmConfig, LlmProvider};

    use super::{call_timeout, client_from_config};

    fn base_config() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Gemini,
            api_key: None,
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn gemini_without_api_key_yields_no_client() {
        assert!(client_from_config(&base_config()).is_none());
    }

    #[test]
    fn gemini_with_api_key_builds_a_client() {
        let config = LlmConfig { api_key: Some("test-key".into()), ..base_config() };
        assert!(client_from_config(&config).is_some());
    }

    #[test]
    fn timeout_is_never_zero() {
        let config = LlmConfig { timeout_secs: 0, ..base_config() };
        assert_eq!(call_timeout(&config).as_secs(), 1);
    }
}

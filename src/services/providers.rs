// Text Generation Gateway
// HTTP provider calls behind a single `TextGenerator` adapter boundary.
// Each provider's response shape is unwrapped here; callers only ever see a
// normalized string or a typed error.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::config_store::{AppConfig, ConfigStore, ProviderConfig};

const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const GLM_DEFAULT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const ANTHROPIC_DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
const DEFAULT_GLM_MODEL: &str = "glm-4-flash";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured for provider '{0}'")]
    MissingApiKey(String),
    #[error("Gateway closed")]
    Closed,
}

/// Recoverable failure of one generation attempt.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),
    #[error("generation timed out after {0}s")]
    Timeout(u64),
    #[error("generator returned empty text")]
    Empty,
}

/// The one interface the humanizer consumes from the outside world.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

/// `name[:model]`; the model falls back to the provider default.
pub fn parse_provider(spec: &str) -> ProviderSpec {
    let parts: Vec<&str> = spec.trim().splitn(2, ':').collect();
    let name = parts[0].trim().to_lowercase();
    let model = parts
        .get(1)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default_model(&name).to_string());
    ProviderSpec { name, model }
}

/// A model configured under `providers.<name>.model` replaces the built-in default
/// when `spec` names none; an explicit `name:model` always wins.
pub fn resolve_provider(spec: &str, providers: &HashMap<String, ProviderConfig>) -> ProviderSpec {
    let explicit = spec
        .split_once(':')
        .is_some_and(|(_, model)| !model.trim().is_empty());
    let mut resolved = parse_provider(spec);
    if !explicit {
        if let Some(model) = providers
            .get(&resolved.name)
            .and_then(|p| p.model.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            resolved.model = model.to_string();
        }
    }
    resolved
}

fn default_model(provider: &str) -> &'static str {
    match provider {
        "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL,
        "deepseek" => DEFAULT_DEEPSEEK_MODEL,
        "glm" => DEFAULT_GLM_MODEL,
        _ => DEFAULT_OPENAI_MODEL,
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

pub struct ProviderClient {
    client: Client,
    urls: HashMap<String, String>,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(80), HashMap::new())
    }
}

impl ProviderClient {
    /// `overrides` maps provider name to base URL (config file), env vars win over both.
    pub fn new(timeout: Duration, overrides: HashMap<String, String>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            urls: resolve_urls(overrides),
        }
    }

    pub fn with_proxy(
        proxy_url: &str,
        timeout: Duration,
        overrides: HashMap<String, String>,
    ) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder().timeout(timeout).proxy(proxy).build()?;
        Ok(Self {
            client,
            urls: resolve_urls(overrides),
        })
    }

    pub fn url_for(&self, provider: &str) -> &str {
        self.urls
            .get(provider)
            .map(String::as_str)
            .unwrap_or(OPENAI_CHAT_URL)
    }

    /// Dispatch one completion to the named provider.
    pub async fn complete(
        &self,
        spec: &ProviderSpec,
        api_key: &str,
        prompt: &str,
        temperature: f64,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        let url = self.url_for(&spec.name);
        match spec.name.as_str() {
            "openai" => {
                self.call_openai_responses(url, &spec.model, api_key, prompt, temperature, max_tokens)
                    .await
            }
            "anthropic" | "claude" => {
                self.call_anthropic(url, &spec.model, api_key, prompt, temperature, max_tokens)
                    .await
            }
            _ => {
                self.call_chat_api(url, &spec.model, api_key, prompt, temperature, max_tokens)
                    .await
            }
        }
    }

    async fn call_openai_responses(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        input: &str,
        temperature: f64,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        let request = serde_json::json!({
            "model": model,
            "input": input,
            "temperature": temperature,
            "max_output_tokens": max_tokens,
        });

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let data = read_json(response).await?;

        Ok(ChatResult {
            content: extract_responses_text(&data).ok_or(ProviderError::MissingContent)?,
            latency_ms,
        })
    }

    async fn call_anthropic(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        user: &str,
        temperature: f64,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        #[derive(Serialize)]
        struct AnthropicRequest {
            model: String,
            max_tokens: i32,
            temperature: f64,
            messages: Vec<ChatMessage>,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Option<Vec<AnthropicContent>>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            text: Option<String>,
        }

        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens,
            // Anthropic caps sampling temperature at 1.0.
            temperature: temperature.min(1.0),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let data: AnthropicResponse = serde_json::from_value(read_json(response).await?)
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .content
            .and_then(|c| c.into_iter().find_map(|c| c.text))
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }

    async fn call_chat_api(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        user: &str,
        temperature: f64,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            max_tokens,
            temperature,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let data: ChatResponse = serde_json::from_value(read_json(response).await?)
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }
}

fn resolve_urls(overrides: HashMap<String, String>) -> HashMap<String, String> {
    let defaults = [
        ("openai", "OPENAI_API_URL", OPENAI_RESPONSES_URL),
        ("deepseek", "DEEPSEEK_API_URL", DEEPSEEK_DEFAULT_URL),
        ("glm", "GLM_API_URL", GLM_DEFAULT_URL),
        ("anthropic", "ANTHROPIC_API_URL", ANTHROPIC_DEFAULT_URL),
        ("claude", "ANTHROPIC_API_URL", ANTHROPIC_DEFAULT_URL),
    ];

    let mut urls = overrides;
    for (name, env_key, default_url) in defaults {
        if let Ok(v) = env::var(env_key) {
            if !v.trim().is_empty() {
                urls.insert(name.to_string(), v.trim().to_string());
                continue;
            }
        }
        urls.entry(name.to_string())
            .or_insert_with(|| default_url.to_string());
    }
    urls
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ProviderError::JsonError(e.to_string()))
}

/// Responses API: `output[].content[].text`, falling back to the `output_text` convenience field.
fn extract_responses_text(data: &serde_json::Value) -> Option<String> {
    let from_output = data["output"].as_array().and_then(|items| {
        items.iter().find_map(|item| {
            item["content"].as_array().and_then(|parts| {
                parts
                    .iter()
                    .find_map(|p| p["text"].as_str().map(|s| s.to_string()))
            })
        })
    });

    from_output.or_else(|| data["output_text"].as_str().map(|s| s.to_string()))
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys: &[&str] = match provider {
        "openai" => &["OPENAI_API_KEY", "HUMANIZER_OPENAI_API_KEY"],
        "anthropic" | "claude" => &["ANTHROPIC_API_KEY", "HUMANIZER_ANTHROPIC_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY", "HUMANIZER_DEEPSEEK_API_KEY"],
        "glm" => &["GLM_API_KEY", "HUMANIZER_GLM_API_KEY"],
        _ => &[],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    ConfigStore::open_default().and_then(|store| store.get_api_key(provider).ok().flatten())
}

/// HTTP-backed generator with bounded in-flight requests.
pub struct ProviderGateway {
    client: ProviderClient,
    spec: ProviderSpec,
    api_key: String,
    max_tokens: i32,
    permits: Arc<Semaphore>,
}

impl ProviderGateway {
    pub fn new(
        client: ProviderClient,
        spec: ProviderSpec,
        api_key: String,
        max_tokens: i32,
        max_concurrent: usize,
    ) -> Self {
        Self {
            client,
            spec,
            api_key,
            max_tokens,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Build from config; `provider_override` replaces the configured `provider[:model]`.
    pub fn from_config(
        config: &AppConfig,
        provider_override: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let spec = resolve_provider(
            provider_override.unwrap_or(&config.gateway.provider),
            &config.providers,
        );
        let api_key = get_api_key(&spec.name)
            .or_else(|| config.api_keys.get(&spec.name).cloned())
            .ok_or_else(|| ProviderError::MissingApiKey(spec.name.clone()))?;

        let overrides: HashMap<String, String> = config
            .providers
            .iter()
            .filter_map(|(name, p)| p.base_url.clone().map(|u| (name.clone(), u)))
            .collect();
        let timeout = Duration::from_secs(config.gateway.http_timeout_secs);

        let client = match config.proxy.as_ref().and_then(|p| p.active_url()) {
            Some(proxy) => ProviderClient::with_proxy(proxy, timeout, overrides)?,
            None => ProviderClient::new(timeout, overrides),
        };

        Ok(Self::new(
            client,
            spec,
            api_key,
            config.gateway.max_tokens,
            config.humanizer.max_concurrent_generations,
        ))
    }

    pub fn spec(&self) -> &ProviderSpec {
        &self.spec
    }
}

#[async_trait]
impl TextGenerator for ProviderGateway {
    async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, GenerationError> {
        // Permit covers only the request itself.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProviderError::Closed)?;

        let result = self
            .client
            .complete(&self.spec, &self.api_key, prompt, temperature, self.max_tokens)
            .await;

        match result {
            Ok(chat) => {
                debug!(
                    "[GATEWAY] {}:{} ok latency_ms={} chars={}",
                    self.spec.name,
                    self.spec.model,
                    chat.latency_ms,
                    chat.content.chars().count()
                );
                if chat.content.trim().is_empty() {
                    return Err(GenerationError::Empty);
                }
                Ok(chat.content)
            }
            Err(e) => {
                warn!("[GATEWAY] {}:{} failed: {}", self.spec.name, self.spec.model, e);
                Err(e.into())
            }
        }
    }
}

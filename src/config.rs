//! Session configuration: completion backend, capability provider launch, log file.
//!
//! Loaded from an optional YAML file, then adjusted by environment overrides:
//! - `MCP_CHAT_CONFIG` (config file path when none is given explicitly)
//! - `MCP_CHAT_MODEL`, `MCP_CHAT_BASE_URL` (OpenAI-style backend only)
//! - `MCP_CHAT_HTTP_TIMEOUT_SECS`, `MCP_CHAT_PROXY_URL`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::{Error, ErrorContext, Result};

/// Keyring service under which backend secrets are looked up.
pub const KEYRING_SERVICE: &str = "mcp-chat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("llm_output.log")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            provider: ProviderConfig::default(),
            log_file: default_log_file(),
            http: HttpConfig::default(),
        }
    }
}

/// Which completion backend to talk to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// OpenAI-compatible chat completions with `functions` / `function_call`.
    OpenaiFunctions(OpenAiBackendConfig),
    /// Single-prompt endpoint answering `{"answer": ...}`.
    PromptEndpoint(PromptEndpointConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::OpenaiFunctions(OpenAiBackendConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiBackendConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Explicit key; otherwise keyring, then `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
}

fn default_openai_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_max_tokens() -> Option<u32> {
    Some(500)
}

impl Default for OpenAiBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl OpenAiBackendConfig {
    /// Keyring account derived from the backend host, e.g. `api.groq.com`.
    fn keyring_account(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| "openai".to_string())
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(
            self.api_key.as_deref(),
            &self.keyring_account(),
            &self.api_key_env,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEndpointConfig {
    /// URL the prompt request is POSTed to.
    pub api_base_url: String,
    /// Model endpoint name forwarded in the request body.
    pub endpoint: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
}

fn default_access_token_env() -> String {
    "LAB_LLM_ACCESS_TOKEN".to_string()
}

impl PromptEndpointConfig {
    /// Load the endpoint description from a JSON file holding
    /// `clearml_ondemand_api_base_url` and `clearml_llm_endpoint`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = load_json_with_keys(
            path.as_ref(),
            &["clearml_ondemand_api_base_url", "clearml_llm_endpoint"],
        )?;
        let field = |key: &str| -> Result<String> {
            data[key].as_str().map(String::from).ok_or_else(|| {
                Error::configuration_with_context(
                    format!("'{key}' must be a string"),
                    ErrorContext::new()
                        .with_field_path(key)
                        .with_source("config_loader"),
                )
            })
        };
        Ok(Self {
            api_base_url: field("clearml_ondemand_api_base_url")?,
            endpoint: field("clearml_llm_endpoint")?,
            access_token: None,
            access_token_env: default_access_token_env(),
        })
    }

    pub fn resolve_access_token(&self) -> Option<String> {
        resolve_secret(
            self.access_token.as_deref(),
            &self.endpoint,
            &self.access_token_env,
        )
    }
}

/// How the capability provider process is started.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Program to run the server script with; inferred from the extension when absent.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the script path.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            proxy_url: None,
        }
    }
}

impl AgentConfig {
    /// Load from `path`, or from `MCP_CHAT_CONFIG`, or fall back to defaults;
    /// then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("MCP_CHAT_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(p) => Self::from_yaml_file(&p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid YAML config: {e}"),
                    ErrorContext::new().with_source("config_loader"),
                )
            })?
        };
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let BackendConfig::OpenaiFunctions(cfg) = &mut self.backend {
            if let Ok(model) = env::var("MCP_CHAT_MODEL") {
                cfg.model = model;
            }
            if let Ok(base_url) = env::var("MCP_CHAT_BASE_URL") {
                cfg.base_url = base_url;
            }
        }
        if let Ok(raw) = env::var("MCP_CHAT_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = raw.trim().parse::<u64>().map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid MCP_CHAT_HTTP_TIMEOUT_SECS '{raw}': {e}"),
                    ErrorContext::new()
                        .with_field_path("http.timeout_secs")
                        .with_source("config_loader"),
                )
            })?;
        }
        if let Ok(proxy) = env::var("MCP_CHAT_PROXY_URL") {
            self.http.proxy_url = Some(proxy);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match &self.backend {
            BackendConfig::OpenaiFunctions(cfg) => {
                validate_url(&cfg.base_url, "backend.base_url")?;
                if cfg.model.trim().is_empty() {
                    return Err(Error::configuration_with_context(
                        "model must not be empty",
                        ErrorContext::new()
                            .with_field_path("backend.model")
                            .with_source("config_loader"),
                    ));
                }
            }
            BackendConfig::PromptEndpoint(cfg) => {
                validate_url(&cfg.api_base_url, "backend.api_base_url")?;
            }
        }
        if let Some(proxy) = &self.http.proxy_url {
            validate_url(proxy, "http.proxy_url")?;
        }
        Ok(())
    }
}

fn validate_url(raw: &str, field: &str) -> Result<()> {
    url::Url::parse(raw).map(|_| ()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL '{raw}': {e}"),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("config_loader"),
        )
    })
}

/// Explicit value, then OS keyring, then environment variable.
fn resolve_secret(explicit: Option<&str>, keyring_account: &str, env_var: &str) -> Option<String> {
    if let Some(v) = explicit.filter(|v| !v.is_empty()) {
        return Some(v.to_string());
    }
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keyring_account) {
        if let Ok(secret) = entry.get_password() {
            return Some(secret);
        }
    }
    env::var(env_var).ok().filter(|v| !v.is_empty())
}

/// Read a JSON object from disk and check that every required key is present.
pub fn load_json_with_keys(path: &Path, required: &[&str]) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&text)?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| data.get(*k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(Error::configuration_with_context(
            format!("missing keys in '{}': {:?}", path.display(), missing),
            ErrorContext::new()
                .with_details(missing.join(", "))
                .with_source("config_loader"),
        ));
    }
    Ok(data)
}

//! Configuration management for ShopBuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.shopbuddy/config.toml
//!
//! The file carries one model set per mode (`[models.development]`,
//! `[models.production]`, ...); `mode` selects which one is active. Loading
//! resolves that selection and validates everything once, so the rest of the
//! program only ever sees a complete, immutable [`BotConfig`].

use crate::errors::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default conversation memory, in user/assistant pairs
pub const DEFAULT_MAX_HISTORY_PAIRS: usize = 10;

/// Which provider endpoint a model is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiType {
    #[serde(rename = "lm_studio")]
    LmStudio,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::LmStudio => "lm_studio",
            ApiType::OpenAi => "openai",
        }
    }
}

/// Pipeline role a model is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    Classifier,
    Responder,
    Validator,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Classifier => "classifier",
            ModelRole::Responder => "responder",
            ModelRole::Validator => "validator",
        }
    }
}

/// Parameters for one model role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub api_type: ApiType,
    pub name: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The three role models of one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleModels {
    pub classifier: ModelConfig,
    pub responder: ModelConfig,
    pub validator: ModelConfig,
}

impl RoleModels {
    pub fn get(&self, role: ModelRole) -> &ModelConfig {
        match role {
            ModelRole::Classifier => &self.classifier,
            ModelRole::Responder => &self.responder,
            ModelRole::Validator => &self.validator,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (ModelRole, &ModelConfig)> {
        [ModelRole::Classifier, ModelRole::Responder, ModelRole::Validator]
            .into_iter()
            .map(move |role| (role, self.get(role)))
    }
}

/// Per-provider string table (endpoints, keys)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_studio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
}

impl ApiTable {
    pub fn get(&self, api_type: ApiType) -> Option<&str> {
        match api_type {
            ApiType::LmStudio => self.lm_studio.as_deref(),
            ApiType::OpenAi => self.openai.as_deref(),
        }
    }
}

/// What the pipeline does when a generated answer scores below threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Up to `max_retries` attempts, keeping the best-scoring answer
    KeepBest,
    /// One attempt, then a fixed generic reply without further model calls
    SingleEscalation,
}

/// Global pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_threshold")]
    pub validation_threshold: u8,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_retry_policy")]
    pub retry_policy: RetryPolicy,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_history_pairs")]
    pub max_history_pairs: usize,
    /// Optional TOML file with `facts = [...]` replacing the built-in corpus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_file: Option<PathBuf>,
}

fn default_threshold() -> u8 {
    7
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_policy() -> RetryPolicy {
    RetryPolicy::KeepBest
}

fn default_timeout() -> u64 {
    60
}

fn default_history_pairs() -> usize {
    DEFAULT_MAX_HISTORY_PAIRS
}

impl RetryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryPolicy::KeepBest => "keep_best",
            RetryPolicy::SingleEscalation => "single_escalation",
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            validation_threshold: default_threshold(),
            max_retries: default_max_retries(),
            retry_policy: default_retry_policy(),
            request_timeout_secs: default_timeout(),
            max_history_pairs: default_history_pairs(),
            knowledge_file: None,
        }
    }
}

/// On-disk layout of config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub models: BTreeMap<String, RoleModels>,
    pub api_endpoints: ApiTable,
    #[serde(default)]
    pub api_keys: ApiTable,
    #[serde(default)]
    pub settings: Settings,
}

fn default_mode() -> String {
    "development".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        let development = RoleModels {
            classifier: ModelConfig {
                api_type: ApiType::LmStudio,
                name: "qwen2.5-7b-instruct".to_string(),
                temperature: 0.0,
                max_tokens: 10,
            },
            responder: ModelConfig {
                api_type: ApiType::LmStudio,
                name: "qwen2.5-7b-instruct".to_string(),
                temperature: 0.3,
                max_tokens: 500,
            },
            validator: ModelConfig {
                api_type: ApiType::LmStudio,
                name: "qwen2.5-7b-instruct".to_string(),
                temperature: 0.0,
                max_tokens: 5,
            },
        };
        let production = RoleModels {
            classifier: ModelConfig {
                api_type: ApiType::OpenAi,
                name: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                max_tokens: 10,
            },
            responder: ModelConfig {
                api_type: ApiType::OpenAi,
                name: "gpt-4o-mini".to_string(),
                temperature: 0.3,
                max_tokens: 500,
            },
            validator: ModelConfig {
                api_type: ApiType::OpenAi,
                name: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                max_tokens: 5,
            },
        };

        let mut models = BTreeMap::new();
        models.insert("development".to_string(), development);
        models.insert("production".to_string(), production);

        Self {
            mode: default_mode(),
            models,
            api_endpoints: ApiTable {
                lm_studio: Some("http://127.0.0.1:1234/v1".to_string()),
                openai: Some("https://api.openai.com/v1".to_string()),
            },
            api_keys: ApiTable {
                lm_studio: Some("lm-studio".to_string()),
                openai: Some("sk-replace-me".to_string()),
            },
            settings: Settings::default(),
        }
    }
}

/// Resolved, validated configuration for the active mode
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub mode: String,
    pub models: RoleModels,
    pub api_endpoints: ApiTable,
    pub api_keys: ApiTable,
    pub settings: Settings,
}

impl BotConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AssistantError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| AssistantError::ConfigError(format!("malformed config: {}", e)))?;
        Self::resolve(file)
    }

    /// Select the active mode and validate every field
    pub fn resolve(file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            mode,
            mut models,
            api_endpoints,
            api_keys,
            settings,
        } = file;

        let models = models.remove(&mode).ok_or_else(|| {
            AssistantError::ConfigError(format!("no [models.{}] section for active mode", mode))
        })?;

        let config = Self {
            mode,
            models,
            api_endpoints,
            api_keys,
            settings,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (role, model) in self.models.iter() {
            let role = role.as_str();
            if model.name.trim().is_empty() {
                return Err(AssistantError::ConfigError(format!(
                    "models.{}.{}.name is empty",
                    self.mode, role
                )));
            }
            if !(0.0..=2.0).contains(&model.temperature) {
                return Err(AssistantError::ConfigError(format!(
                    "models.{}.{}.temperature {} outside 0.0..=2.0",
                    self.mode, role, model.temperature
                )));
            }
            if model.max_tokens == 0 {
                return Err(AssistantError::ConfigError(format!(
                    "models.{}.{}.max_tokens must be positive",
                    self.mode, role
                )));
            }
            let api = model.api_type.as_str();
            if self.api_endpoints.get(model.api_type).is_none() {
                return Err(AssistantError::ConfigError(format!(
                    "api_endpoints.{} missing (used by {})",
                    api, role
                )));
            }
            if self.api_keys.get(model.api_type).is_none() {
                return Err(AssistantError::ConfigError(format!(
                    "api_keys.{} missing (used by {})",
                    api, role
                )));
            }
        }

        let s = &self.settings;
        if s.validation_threshold > 10 {
            return Err(AssistantError::ConfigError(format!(
                "settings.validation_threshold {} outside 0..=10",
                s.validation_threshold
            )));
        }
        if s.request_timeout_secs == 0 {
            return Err(AssistantError::ConfigError(
                "settings.request_timeout_secs must be positive".to_string(),
            ));
        }
        if s.max_history_pairs == 0 {
            return Err(AssistantError::ConfigError(
                "settings.max_history_pairs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Model parameters for a role
    pub fn model(&self, role: ModelRole) -> &ModelConfig {
        self.models.get(role)
    }

    pub fn endpoint(&self, api_type: ApiType) -> Option<&str> {
        self.api_endpoints.get(api_type)
    }

    pub fn api_key(&self, api_type: ApiType) -> Option<&str> {
        self.api_keys.get(api_type)
    }

    /// Copy with API keys replaced, safe to print
    pub fn masked(&self) -> Self {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "****".to_string());
        Self {
            api_keys: ApiTable {
                lm_studio: mask(&self.api_keys.lm_studio),
                openai: mask(&self.api_keys.openai),
            },
            ..self.clone()
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            AssistantError::ConfigError("could not determine home directory".to_string())
        })?;
        Ok(home.join(".shopbuddy").join("config.toml"))
    }

    /// Default configuration as commented TOML
    pub fn template() -> Result<String> {
        let body = toml::to_string_pretty(&ConfigFile::default())
            .map_err(|e| AssistantError::ConfigError(format!("cannot serialize template: {}", e)))?;
        let d = Settings::default();
        let header = format!(
            "# ShopBuddy configuration\n\
             #\n\
             # `mode` picks one [models.<mode>] set. Each role needs an endpoint for its\n\
             # api_type under [api_endpoints], plus a key under [api_keys] for openai.\n\
             #\n\
             # [settings] is optional. A missing table, or any key missing from it,\n\
             # falls back to: validation_threshold = {}, max_retries = {},\n\
             # retry_policy = \"{}\", request_timeout_secs = {},\n\
             # max_history_pairs = {}, debug_mode = {}.\n",
            d.validation_threshold,
            d.max_retries,
            d.retry_policy.as_str(),
            d.request_timeout_secs,
            d.max_history_pairs,
            d.debug_mode,
        );
        Ok(format!("{}\n{}", header, body))
    }

    /// Write a default configuration template, refusing to overwrite
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(AssistantError::ConfigError(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::template()?)?;
        Ok(())
    }
}

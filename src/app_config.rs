/*!
 * Application configuration.
 *
 * This module handles loading, validating and saving configuration,
 * including the provider catalog that maps provider and model identifiers
 * to endpoint shapes and generation parameters.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

/// Log level for process logging
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Request shape a provider endpoint speaks
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndpointShape {
    /// Gemini-style generateContent endpoint, API key as query parameter
    Gemini,
    /// OpenAI-compatible chat completions endpoint, Bearer auth
    OpenAiChat,
}

impl std::fmt::Display for EndpointShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAiChat => write!(f, "openai_chat"),
        }
    }
}

impl std::str::FromStr for EndpointShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai_chat" | "openai" => Ok(Self::OpenAiChat),
            _ => Err(anyhow!("Invalid endpoint shape: {}", s)),
        }
    }
}

/// Generation parameters for one model of a provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    /// Model-specific endpoint override (full URL)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whether the model emits reasoning spans that must be stripped
    #[serde(default)]
    pub thinking: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            thinking: false,
        }
    }
}

/// One provider in the catalog
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderEntry {
    /// Human-readable provider name
    pub name: String,

    /// Request/response shape of the endpoint
    pub shape: EndpointShape,

    /// Base URL for the provider API
    pub base_url: String,

    /// Persistent API key (may be empty; a session override can supply it)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Models available through this provider
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,
}

/// Catalog mapping provider identifiers to their configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderCatalog {
    /// Provider entries keyed by identifier
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        let mut providers = HashMap::new();

        let mut gemini_models = HashMap::new();
        gemini_models.insert("gemini-2.0-flash".to_string(), ModelConfig::default());
        gemini_models.insert(
            "gemini-2.5-pro".to_string(),
            ModelConfig {
                thinking: true,
                ..ModelConfig::default()
            },
        );
        providers.insert(
            "gemini".to_string(),
            ProviderEntry {
                name: "Google Gemini".to_string(),
                shape: EndpointShape::Gemini,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                api_key: String::new(),
                models: gemini_models,
            },
        );

        let mut openai_models = HashMap::new();
        openai_models.insert("gpt-4o-mini".to_string(), ModelConfig::default());
        openai_models.insert("gpt-4o".to_string(), ModelConfig::default());
        providers.insert(
            "openai".to_string(),
            ProviderEntry {
                name: "OpenAI".to_string(),
                shape: EndpointShape::OpenAiChat,
                base_url: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: String::new(),
                models: openai_models,
            },
        );

        Self { providers }
    }
}

impl ProviderCatalog {
    /// Look up a provider entry
    pub fn provider(&self, provider_id: &str) -> Result<&ProviderEntry, ProviderError> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))
    }

    /// Look up the model configuration for a provider/model pair
    pub fn model_config(
        &self,
        provider_id: &str,
        model_id: &str,
    ) -> Result<&ModelConfig, ProviderError> {
        let entry = self.provider(provider_id)?;
        entry
            .models
            .get(model_id)
            .ok_or_else(|| ProviderError::UnknownModel {
                provider: provider_id.to_string(),
                model: model_id.to_string(),
            })
    }

    /// Check that a provider/model pair exists in the catalog
    pub fn validate(&self, provider_id: &str, model_id: &str) -> Result<(), ProviderError> {
        self.model_config(provider_id, model_id).map(|_| ())
    }
}

/// Resolves API keys, preferring session-temporary overrides over the
/// persisted catalog key.
#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    /// Session-scoped keys, e.g. supplied on the command line
    overrides: HashMap<String, String>,
}

impl CredentialStore {
    /// Create an empty credential store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a session override for a provider
    pub fn set_override(&mut self, provider_id: impl Into<String>, key: impl Into<String>) {
        self.overrides.insert(provider_id.into(), key.into());
    }

    /// Resolve the API key for a provider
    pub fn resolve(
        &self,
        catalog: &ProviderCatalog,
        provider_id: &str,
    ) -> Result<String, ProviderError> {
        if let Some(key) = self.overrides.get(provider_id) {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }

        let entry = catalog.provider(provider_id)?;
        if entry.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey(provider_id.to_string()));
        }
        Ok(entry.api_key.clone())
    }
}

/// Auto-segmentation heuristics applied before handing text to the engine
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmentationConfig {
    /// Whether auto-segmentation is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Only texts longer than this are segmented
    #[serde(default = "default_segmentation_threshold")]
    pub threshold: usize,

    /// Soft target size of each segment
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            threshold: default_segmentation_threshold(),
            segment_size: default_segment_size(),
        }
    }
}

impl SegmentationConfig {
    /// Segment size to use for a text of the given length, or `None`
    /// when the text should stay whole.
    pub fn effective_segment_size(&self, text_len: usize) -> Option<usize> {
        if self.enabled && text_len > self.threshold {
            Some(self.segment_size)
        } else {
            None
        }
    }
}

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Seconds to wait between sequential provider calls
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,

    /// Provider request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Auto-segmentation settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Provider catalog
    #[serde(default)]
    pub providers: ProviderCatalog,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            pacing_secs: default_pacing_secs(),
            timeout_secs: default_timeout_secs(),
            segmentation: SegmentationConfig::default(),
            providers: ProviderCatalog::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return Err(anyhow!("Source and target languages must not be empty"));
        }
        if self.source_language == self.target_language {
            return Err(anyhow!(
                "Source and target languages must differ: {}",
                self.source_language
            ));
        }
        Ok(())
    }

    /// Default config directory (`<config_dir>/chaptrans`)
    pub fn default_config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(base.join("chaptrans"))
    }

    /// Default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }
}

fn default_true() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_pacing_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_segmentation_threshold() -> usize {
    6000
}

fn default_segment_size() -> usize {
    3000
}

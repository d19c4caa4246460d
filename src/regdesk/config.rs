//! Configuration for regdesk.
//!
//! Provides the [`AssistantConfig`] struct describing how to reach the model
//! endpoint. Users construct this manually — no config-file parsing
//! dependencies are required.
//!
//! # Example
//!
//! ```rust
//! use regdesk::AssistantConfig;
//!
//! // Use the defaults (a local Ollama endpoint)
//! let config = AssistantConfig::default();
//!
//! // Or point at a specific deployment
//! let config = AssistantConfig {
//!     base_url: "http://inference.internal:11434".into(),
//!     model: "llama3.1:8b-instruct-q4_K_M".into(),
//!     ..AssistantConfig::default()
//! };
//! ```

use std::env;

/// Default chat model pulled into a stock Ollama install.
pub const DEFAULT_MODEL: &str = "qwen2.5:1.5b-instruct-q4_K_M";

/// Default Ollama endpoint on the local machine.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Sampling temperature used for every completion request.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Connection settings for the model endpoint.
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Base URL of the Ollama-compatible endpoint (no trailing path).
    pub base_url: String,
    /// Model identifier injected into each request.
    pub model: String,
    /// Sampling temperature for every request.
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl AssistantConfig {
    /// Build a config from the environment.
    ///
    /// Honors `OLLAMA_URL` and `OLLAMA_MODEL`; anything unset falls back to
    /// the defaults.
    pub fn from_env() -> Self {
        let mut config = AssistantConfig::default();
        if let Ok(url) = env::var("OLLAMA_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        config
    }
}

//! Connection and bootstrap settings for the authorization engine

use crate::error::{FgaError, Result};
use crate::model::ModelDefinition;
use crate::policy::FailSafePolicy;
use std::path::Path;

pub const ENV_API_URL: &str = "FGA_API_URL";
pub const ENV_STORE_ID: &str = "FGA_STORE_ID";
pub const ENV_MODEL_ID: &str = "FGA_MODEL_ID";
pub const ENV_STORE_NAME: &str = "FGA_STORE_NAME";
pub const ENV_API_TOKEN: &str = "FGA_API_TOKEN";
pub const ENV_TIMEOUT_SECONDS: &str = "FGA_TIMEOUT_SECONDS";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_STORE_NAME: &str = "rustcare";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct FgaConfig {
    /// Engine base URL, e.g. `http://openfga:8080`
    pub api_url: String,
    /// Existing store; created at bootstrap when absent
    pub store_id: Option<String>,
    /// Default model; written from `model_definition` at bootstrap when absent
    pub model_id: Option<String>,
    /// Name used when bootstrap has to create a store
    pub store_name: String,
    /// Bearer token for engines behind pre-shared-key auth
    pub api_token: Option<String>,
    /// Request timeout for the HTTP transport
    pub timeout_seconds: u64,
    pub model_definition: Option<ModelDefinition>,
    pub failure_policy: FailSafePolicy,
}

impl Default for FgaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            store_id: None,
            model_id: None,
            store_name: DEFAULT_STORE_NAME.to_string(),
            api_token: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            model_definition: None,
            failure_policy: FailSafePolicy::default(),
        }
    }
}

impl FgaConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn with_store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = store_name.into();
        self
    }

    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_model_definition(mut self, model: ModelDefinition) -> Self {
        self.model_definition = Some(model);
        self
    }

    pub fn with_model_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let model = ModelDefinition::from_file(path)?;
        Ok(self.with_model_definition(model))
    }

    pub fn with_failure_policy(mut self, policy: FailSafePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Overlay process environment on top of the explicit values.
    ///
    /// # Errors
    ///
    /// Fails when `FGA_TIMEOUT_SECONDS` is set but not a number.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; set, non-blank values win over explicit ones.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_url) = read(ENV_API_URL) {
            self.api_url = api_url;
        }
        if let Some(store_id) = read(ENV_STORE_ID) {
            self.store_id = Some(store_id);
        }
        if let Some(model_id) = read(ENV_MODEL_ID) {
            self.model_id = Some(model_id);
        }
        if let Some(store_name) = read(ENV_STORE_NAME) {
            self.store_name = store_name;
        }
        if let Some(api_token) = read(ENV_API_TOKEN) {
            self.api_token = Some(api_token);
        }
        if let Some(timeout) = read(ENV_TIMEOUT_SECONDS) {
            self.timeout_seconds = timeout.trim().parse().map_err(|e| {
                FgaError::Configuration(format!("{} must be a number of seconds: {}", ENV_TIMEOUT_SECONDS, e))
            })?;
        }

        Ok(self)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FgaConfig::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.store_name, DEFAULT_STORE_NAME);
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.store_id.is_none());
        assert!(config.model_id.is_none());
    }

    #[test]
    fn test_environment_takes_precedence() {
        let config = FgaConfig::new("http://explicit:8080")
            .with_store_id("explicit-store")
            .with_model_id("explicit-model")
            .with_env_from(env(&[
                (ENV_API_URL, "http://from-env:8080/"),
                (ENV_STORE_ID, "env-store"),
                (ENV_TIMEOUT_SECONDS, "5"),
            ]))
            .unwrap();

        assert_eq!(config.api_url(), "http://from-env:8080");
        assert_eq!(config.store_id.as_deref(), Some("env-store"));
        // Not set in the environment, so the explicit value survives
        assert_eq!(config.model_id.as_deref(), Some("explicit-model"));
        assert_eq!(config.timeout_seconds, 5);
    }

    #[test]
    fn test_blank_environment_values_ignored() {
        let config = FgaConfig::new("http://explicit:8080")
            .with_model_id("explicit-model")
            .with_env_from(env(&[(ENV_MODEL_ID, "  "), (ENV_API_URL, "")]))
            .unwrap();

        assert_eq!(config.model_id.as_deref(), Some("explicit-model"));
        assert_eq!(config.api_url(), "http://explicit:8080");
    }

    #[test]
    fn test_invalid_timeout() {
        let err = FgaConfig::default()
            .with_env_from(env(&[(ENV_TIMEOUT_SECONDS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, FgaError::Configuration(_)));
    }
}

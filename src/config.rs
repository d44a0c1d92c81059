//! Turns CLI/env settings into a ready-to-use [`RecipeAdapter`].
//!
//! Resolution order for every setting: CLI flag > env var (including `.env`)
//! > built-in default.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::adapter::{AdapterConfig, RecipeAdapter};
use crate::api_connection::endpoints::{CEREBRAS_API_KEY_ENV_VAR, OPENROUTER_API_KEY_ENV_VAR};
use crate::api_connection::{ApiClient, Provider};
use crate::cli::{ProviderKind, ServiceArgs};
use crate::prompts::PromptSet;

impl ServiceArgs {
    pub fn api_key_env_var(&self) -> &str {
        match (&self.api_key_var, self.provider) {
            (Some(name), _) => name,
            (None, ProviderKind::Cerebras) => CEREBRAS_API_KEY_ENV_VAR,
            (None, ProviderKind::Openrouter) => OPENROUTER_API_KEY_ENV_VAR,
        }
    }

    pub fn api_key_present(&self) -> bool {
        env::var(self.api_key_env_var()).is_ok_and(|key| !key.trim().is_empty())
    }

    pub fn provider(&self) -> Provider {
        match self.provider {
            ProviderKind::Cerebras => Provider::cerebras(self.api_key_env_var()),
            ProviderKind::Openrouter => Provider::openrouter(self.api_key_env_var()),
        }
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            model: self.model.clone(),
            max_retries: self.max_retries,
            stage_timeout: self.timeout(),
            ..AdapterConfig::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load templates and build the adapter over the real completion API.
    pub async fn build_adapter(&self) -> Result<RecipeAdapter> {
        let prompts = PromptSet::load(&self.prompts_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to load prompt templates from '{}'",
                    self.prompts_dir.display()
                )
            })?;

        let provider = self.provider();
        if !self.api_key_present() {
            tracing::warn!(
                var = provider.api_key_env_var(),
                "API key variable is not set; completion calls will fail"
            );
        }

        let client = ApiClient::new(provider, self.timeout())
            .context("Failed to build HTTP client for the completion service")?;
        tracing::info!(
            provider = client.provider().name(),
            model = %self.model,
            max_retries = self.max_retries,
            "recipe adapter configured"
        );

        Ok(RecipeAdapter::new(
            Arc::new(client),
            prompts,
            self.adapter_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::api_connection::DEFAULT_MODEL;

    fn args(provider: ProviderKind, api_key_var: Option<&str>) -> ServiceArgs {
        ServiceArgs {
            provider,
            api_key_var: api_key_var.map(str::to_string),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 5,
            max_retries: 1,
            prompts_dir: PathBuf::from("contexts"),
        }
    }

    #[test]
    fn key_variable_defaults_per_provider() {
        assert_eq!(args(ProviderKind::Cerebras, None).api_key_env_var(), "CEREBRAS_API_KEY");
        assert_eq!(args(ProviderKind::Openrouter, None).api_key_env_var(), "OPENROUTER_API_KEY");
        assert_eq!(args(ProviderKind::Cerebras, Some("MY_KEY")).api_key_env_var(), "MY_KEY");
    }

    #[test]
    fn adapter_config_carries_cli_settings() {
        let config = args(ProviderKind::Cerebras, None).adapter_config();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.stage_timeout, Duration::from_secs(5));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn build_adapter_fails_without_templates() {
        let tmp = tempfile::tempdir().unwrap();
        let mut service = args(ProviderKind::Cerebras, None);
        service.prompts_dir = tmp.path().to_path_buf();

        let err = service.build_adapter().await.err().unwrap();
        assert!(format!("{err:#}").contains("prompt templates"));
    }
}

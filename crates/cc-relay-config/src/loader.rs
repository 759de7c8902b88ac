use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail, ensure};

use crate::Config;

impl Config {
    /// Loads, expands `{{ env.VAR }}` placeholders in, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, env expansion fails, the TOML is malformed,
    /// or [`Config::validate`] rejects the result.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        let expanded = crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!(e))?;
        let config: Self = toml::from_str(&expanded).with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid aspect of the configuration found.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.providers.is_empty(), "at least one provider must be configured");

        let mut seen = HashSet::new();
        for provider in &self.providers {
            ensure!(seen.insert(provider.name.as_str()), "duplicate provider name: `{}`", provider.name);
            ensure!(
                !provider.credentials.is_empty() || matches!(provider.adapter, crate::AdapterConfig::Ollama),
                "provider `{}` has no credentials configured",
                provider.name
            );
        }

        for provider_name in self.routing.model_mapping.values() {
            ensure!(
                seen.contains(provider_name.as_str()),
                "routing.model_mapping references unknown provider `{provider_name}`"
            );
        }

        if let Some(default_provider) = &self.routing.default_provider {
            ensure!(
                seen.contains(default_provider.as_str()),
                "routing.default_provider references unknown provider `{default_provider}`"
            );
        }

        if self.routing.strategy == crate::RoutingStrategy::ModelBased
            && self.routing.model_mapping.is_empty()
            && self.routing.default_provider.is_none()
        {
            bail!("model_based routing strategy requires routing.model_mapping or routing.default_provider");
        }

        Ok(())
    }
}

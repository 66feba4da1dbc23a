//! Configuration management for the CLI.

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use litminer_llm::{provider_spec, ClientSettings, ProviderSpec};
use litminer_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider used when `--provider` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Per-provider credentials and overrides, keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

/// Stored settings for one provider.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Everything needed to build a client for one run.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    /// Registry entry
    pub spec: &'static ProviderSpec,
    /// Client settings with retry and timeout from the pipeline config
    pub settings: ClientSettings,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".litminer").join("config.toml"))
    }

    /// Load configuration from `path` (or the default path), falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            config.pipeline.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// A starter configuration with an entry for every provider.
    pub fn template() -> Self {
        let providers = litminer_llm::supported_providers()
            .iter()
            .map(|spec| {
                (
                    spec.name.to_string(),
                    ProviderSettings {
                        api_key: None,
                        model: Some(spec.default_model.to_string()),
                        endpoint: None,
                    },
                )
            })
            .collect();

        Self {
            default_provider: Some("openai".to_string()),
            pipeline: PipelineConfig::default(),
            providers,
        }
    }

    /// Stored settings for a provider; keys may use any alias.
    pub fn provider_settings(&self, spec: &ProviderSpec) -> Option<&ProviderSettings> {
        self.providers
            .iter()
            .find(|(key, _)| provider_spec(key).is_some_and(|found| found.name == spec.name))
            .map(|(_, settings)| settings)
    }

    /// Apply command-line overrides to the pipeline settings.
    pub fn pipeline_for(&self, args: &RunArgs) -> Result<PipelineConfig> {
        let mut pipeline = self.pipeline.clone();
        if let Some(workers) = args.workers {
            pipeline.max_workers = workers;
        }
        if let Some(interval) = args.save_interval {
            pipeline.save_interval = interval;
        }
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Resolve provider, credential, model and endpoint.
    ///
    /// Command-line values win over the config file, which wins over the
    /// provider registry defaults.
    pub fn resolve_provider(&self, args: &RunArgs, pipeline: &PipelineConfig) -> Result<ResolvedProvider> {
        let name = args
            .provider
            .as_deref()
            .or(self.default_provider.as_deref())
            .unwrap_or("openai");
        let spec = provider_spec(name).ok_or_else(|| {
            let known: Vec<&str> = litminer_llm::supported_providers().iter().map(|s| s.name).collect();
            CliError::InvalidInput(format!("Unknown provider '{}' (supported: {})", name, known.join(", ")))
        })?;
        let stored = self.provider_settings(spec);

        let api_key = non_blank(args.api_key.as_deref())
            .or_else(|| non_blank(stored.and_then(|s| s.api_key.as_deref())))
            .ok_or_else(|| CliError::MissingApiKey(spec.name.to_string()))?;
        let model = non_blank(args.model.as_deref())
            .or_else(|| non_blank(stored.and_then(|s| s.model.as_deref())))
            .unwrap_or(spec.default_model);
        let endpoint = non_blank(args.endpoint.as_deref())
            .or_else(|| non_blank(stored.and_then(|s| s.endpoint.as_deref())))
            .unwrap_or(spec.default_endpoint);

        let settings = ClientSettings::new(api_key, model, endpoint)
            .with_retry(pipeline.retry_policy())
            .with_timeout(pipeline.request_timeout());
        Ok(ResolvedProvider { spec, settings })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run", "-i", "in.csv", "-o", "out.csv", "--prompt", "p.txt"];
        argv.extend_from_slice(extra);
        RunArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.default_provider.is_none());
        assert!(config.providers.is_empty());
        assert_eq!(config.pipeline.max_workers, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::template();
        config.pipeline.save_interval = 25;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.default_provider.as_deref(), Some("openai"));
        assert_eq!(loaded.pipeline.save_interval, 25);
        assert_eq!(loaded.providers.len(), litminer_llm::supported_providers().len());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_invalid_pipeline_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nmax_workers = 0\n").unwrap();
        assert!(matches!(Config::load(Some(path.as_path())), Err(CliError::Pipeline(_))));
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        config.default_provider = Some("deepseek".into());
        config.providers.insert(
            "deepseek".into(),
            ProviderSettings {
                api_key: Some("from-file".into()),
                model: Some("deepseek-reasoner".into()),
                endpoint: None,
            },
        );

        let args = run_args(&["--api-key", "from-flag"]);
        let pipeline = config.pipeline_for(&args).unwrap();
        let resolved = config.resolve_provider(&args, &pipeline).unwrap();

        assert_eq!(resolved.spec.name, "deepseek");
        assert_eq!(resolved.settings.credential, "from-flag");
        assert_eq!(resolved.settings.model, "deepseek-reasoner");
        assert_eq!(resolved.settings.endpoint, resolved.spec.default_endpoint);
    }

    #[test]
    fn test_alias_keys_match() {
        let mut config = Config::default();
        config.providers.insert(
            "claude".into(),
            ProviderSettings {
                api_key: Some("k".into()),
                ..Default::default()
            },
        );

        let args = run_args(&["-p", "anthropic"]);
        let resolved = config.resolve_provider(&args, &config.pipeline).unwrap();
        assert_eq!(resolved.settings.credential, "k");
        assert_eq!(resolved.settings.model, resolved.spec.default_model);
    }

    #[test]
    fn test_missing_api_key() {
        let config = Config::default();
        let args = run_args(&["-p", "moonshot"]);
        let err = config.resolve_provider(&args, &config.pipeline).unwrap_err();
        assert!(matches!(err, CliError::MissingApiKey(name) if name == "moonshot"));
    }

    #[test]
    fn test_unknown_provider() {
        let config = Config::default();
        let args = run_args(&["-p", "gemini", "--api-key", "k"]);
        assert!(matches!(
            config.resolve_provider(&args, &config.pipeline),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pipeline_overrides() {
        let config = Config::default();
        let args = run_args(&["-w", "4", "--save-interval", "7"]);
        let pipeline = config.pipeline_for(&args).unwrap();
        assert_eq!(pipeline.max_workers, 4);
        assert_eq!(pipeline.save_interval, 7);

        let args = run_args(&["-w", "0"]);
        assert!(config.pipeline_for(&args).is_err());
    }
}

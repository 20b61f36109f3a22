use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::RelayError;
use crate::provider::{gemini, openai};
use crate::relay::SamplingParams;
use crate::retry::RetryPolicy;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_DIR: &str = "frontend/dist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Result<Self, RelayError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(RelayError::Config(format!(
                "unknown LLM_PROVIDER '{other}' (expected 'openai' or 'gemini')"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    fn base_url_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::Gemini => "GEMINI_BASE_URL",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => openai::DEFAULT_BASE_URL,
            Self::Gemini => gemini::DEFAULT_BASE_URL,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => openai::DEFAULT_MODEL,
            Self::Gemini => gemini::DEFAULT_MODEL,
        }
    }
}

pub struct Config {
    pub provider: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub port: u16,
    /// Value of `APP_ENV`, reported at startup.
    pub environment: String,
    /// Serve the built frontend and fall back to its `index.html`.
    pub production: bool,
    pub frontend_dir: PathBuf,
    pub sampling: SamplingParams,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("production", &self.production)
            .field("frontend_dir", &self.frontend_dir)
            .field("sampling", &self.sampling)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Read the process environment, then apply the optional `RELAY_CONFIG`
    /// TOML file on top.
    pub fn load() -> Result<Self, RelayError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(p) => ProviderKind::parse(&p)?,
            None => ProviderKind::OpenAi,
        };

        let api_key = var(provider.key_var()).ok_or_else(|| {
            RelayError::Config(format!("{} is missing", provider.key_var()))
        })?;

        let base_url = var(provider.base_url_var())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| RelayError::Config(format!("invalid PORT '{p}'")))?,
            None => DEFAULT_PORT,
        };

        let environment = var("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = environment.eq_ignore_ascii_case("production");

        let frontend_dir = var("FRONTEND_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FRONTEND_DIR));

        let model = var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let mut config = Config {
            provider,
            api_key,
            base_url,
            port,
            environment,
            production,
            frontend_dir,
            sampling: SamplingParams::for_model(model),
            retry: RetryPolicy::default(),
        };

        if let Some(path) = var("RELAY_CONFIG") {
            let file = FileConfig::read(Path::new(&path))?;
            file.apply(&mut config);
        }

        Ok(config)
    }
}

/// Optional TOML tuning file.
///
/// ```toml
/// [sampling]
/// temperature = 0.2
///
/// [retry]
/// max_attempts = 5
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub sampling: SamplingOverrides,
    #[serde(default)]
    pub retry: RetryOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingOverrides {
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryOverrides {
    pub max_attempts: Option<u32>,
    pub rate_limit_delay_ms: Option<u64>,
    pub server_error_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, RelayError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
            .map_err(|e| RelayError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, RelayError> {
        toml::from_str(text).map_err(|e| RelayError::Config(e.to_string()))
    }

    pub fn apply(&self, config: &mut Config) {
        let s = &self.sampling;
        if let Some(model) = &s.model {
            config.sampling.model = model.clone();
        }
        if let Some(instruction) = &s.system_instruction {
            config.sampling.system_instruction = instruction.clone();
        }
        if let Some(t) = s.temperature {
            config.sampling.temperature = t;
        }
        if let Some(n) = s.max_output_tokens {
            config.sampling.max_output_tokens = n;
        }

        let r = &self.retry;
        if let Some(n) = r.max_attempts {
            // Zero attempts would never reach the provider.
            config.retry.max_attempts = n.max(1);
        }
        if let Some(ms) = r.rate_limit_delay_ms {
            config.retry.rate_limit_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = r.server_error_delay_ms {
            config.retry.server_error_delay = Duration::from_millis(ms);
        }
    }
}

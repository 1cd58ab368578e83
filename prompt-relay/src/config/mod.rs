use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Value shipped in the deployment template in place of a real key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_GEMINI_API_KEY_HERE";

const DEFAULT_ALLOWED_ORIGIN: &str = "https://divorceeasy.thefuturesmachines.com";
const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub upstream: UpstreamConfig,
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" | "test" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("Unknown ENVIRONMENT '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Absent when the deployment never set `GOOGLE_API_KEY`.
    pub api_key: Option<Secret<String>>,
}

impl GoogleConfig {
    /// A key counts as configured when it is set, non-blank and not the placeholder.
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_ref()
            .map(|key| {
                let key = key.expose_secret().trim();
                !key.is_empty() && key != PLACEHOLDER_API_KEY
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model used for `generateContent` (e.g., gemini-1.5-flash-latest)
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the relay settings from `lookup`. Every setting falls back to its
    /// default when unset, in any environment; a missing key is reported per
    /// request rather than at startup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = lookup("ENVIRONMENT")
            .as_deref()
            .unwrap_or("dev")
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = RelayConfig {
            common,
            environment,
            service_name: get_env(&lookup, "SERVICE_NAME", "prompt-relay"),
            log_level: get_env(&lookup, "LOG_LEVEL", "info"),
            google: GoogleConfig {
                api_key: lookup("GOOGLE_API_KEY").map(Secret::new),
            },
            models: ModelConfig {
                text_model: get_env(&lookup, "GENAI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            },
            upstream: UpstreamConfig {
                base_url: get_env(&lookup, "GEMINI_API_BASE", DEFAULT_API_BASE),
                timeout_secs: parse_env(&lookup, "GEMINI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            },
            cors: CorsConfig {
                allowed_origin: get_env(&lookup, "CORS_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
            },
            limits: LimitsConfig {
                max_body_bytes: parse_env(
                    &lookup,
                    "RELAY_MAX_BODY_BYTES",
                    DEFAULT_MAX_BODY_BYTES,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which no request could succeed.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_TIMEOUT_SECS must be greater than zero"
            )));
        }
        if self.limits.max_body_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RELAY_MAX_BODY_BYTES must be greater than zero"
            )));
        }
        Ok(())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e))
        }),
        None => Ok(default),
    }
}

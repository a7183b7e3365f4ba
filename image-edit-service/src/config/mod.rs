use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Singapore-region DashScope endpoint.
pub const DEFAULT_DASHSCOPE_BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/api/v1";
pub const DEFAULT_MODEL: &str = "qwen-image-edit";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";

/// Message returned by `/api/edit` while the service runs without a credential.
pub fn missing_api_key_message() -> String {
    format!(
        "{} is not configured on the server; set it and restart the service",
        API_KEY_ENV
    )
}

#[derive(Debug, Clone)]
pub struct EditConfig {
    pub common: core_config::Config,
    pub dashscope: DashScopeConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct DashScopeConfig {
    /// `None` when the variable is unset or blank; the edit route then answers
    /// with a configuration failure instead of calling out.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl EditConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Builds the service settings from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);

        let base_url = lookup("DASHSCOPE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_DASHSCOPE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let max_bytes: usize = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAX_UPLOAD_BYTES must be greater than zero"
            )));
        }

        Ok(EditConfig {
            common,
            dashscope: DashScopeConfig {
                api_key,
                base_url,
                model: lookup("IMAGE_EDIT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout_secs: parse_or(
                    &lookup,
                    "PROVIDER_TIMEOUT_SECS",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                )?,
            },
            upload: UploadConfig { max_bytes },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

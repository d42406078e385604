use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const ENV_API_URL: &str = "STEPFORM_API_URL";
pub const ENV_API_TOKEN: &str = "STEPFORM_API_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while resolving gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no API base URL configured (set base_url, STEPFORM_API_URL or --api-url)")]
    MissingBaseUrl,
    #[error("timeout_secs must be at least 1")]
    ZeroTimeout,
    #[error("invalid API base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    token: Option<String>,
}

/// Resolved settings for talking to the remote form API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

impl GatewayConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(raw)?;
        Self::from_layers(raw, None, |_| None)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_raw(path)?;
        Self::from_layers(raw, None, |_| None)
    }

    /// Resolves configuration from the process environment.
    ///
    /// Precedence, lowest first: config file, `STEPFORM_API_URL` /
    /// `STEPFORM_API_TOKEN`, then `api_url`.
    pub fn resolve(path: Option<&Path>, api_url: Option<&str>) -> Result<Self, ConfigError> {
        Self::resolve_with(path, api_url, |key| std::env::var(key).ok())
    }

    /// Like [`GatewayConfig::resolve`] with an injectable environment lookup.
    ///
    /// An explicit `path` must exist; the default path is only read when present.
    pub fn resolve_with<F>(
        path: Option<&Path>,
        api_url: Option<&str>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = match path {
            Some(path) => read_raw(path)?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => read_raw(&path)?,
                None => RawConfig::default(),
            },
        };
        Self::from_layers(raw, api_url, env)
    }

    fn from_layers<F>(
        mut raw: RawConfig,
        api_url: Option<&str>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(ENV_API_URL).filter(|url| !url.is_empty()) {
            raw.base_url = Some(url);
        }
        if let Some(token) = env(ENV_API_TOKEN).filter(|token| !token.is_empty()) {
            raw.token = Some(token);
        }
        if let Some(url) = api_url {
            raw.base_url = Some(url.to_string());
        }
        let base_url = raw.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let timeout_secs = match raw.timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => secs,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            timeout_secs,
            token: raw.token,
        })
    }
}

/// `<config dir>/stepform/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stepform").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

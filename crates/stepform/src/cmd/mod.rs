use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use stepform_gateway::{GatewayConfig, HttpGateway};

pub mod check;
pub mod fill;
pub mod forms;
pub mod schema;
pub mod steps;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub json: bool,
}

impl Globals {
    pub fn gateway(&self) -> Result<HttpGateway> {
        let config = GatewayConfig::resolve(self.config.as_deref(), self.api_url.as_deref())
            .context("failed to resolve API configuration")?;
        tracing::debug!(base_url = %config.base_url, "using form API");
        HttpGateway::new(&config).context("failed to build API client")
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode JSON output")?;
    println!("{text}");
    Ok(())
}

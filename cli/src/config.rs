use anyhow::Context;
use anyhow::Result;
use mettakg_explore_client::ClientConfig;
use mettakg_explorer::ExplorerConfig;
use serde::Deserialize;
use std::path::Path;

/// Contents of the `mettakg-explore` TOML file.
///
/// ```toml
/// [explorer]
/// batch_size = 5
///
/// [client]
/// base_url = "http://localhost:8000"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.explorer.validate().context("invalid [explorer] table")?;
        self.client.validate().context("invalid [client] table")?;
        Ok(())
    }
}

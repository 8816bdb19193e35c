//! Configuration loading from refscan.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// Main configuration structure for refscan.toml.
#[derive(Debug, Deserialize, Default)]
pub struct RefscanConfig {
    /// Root artifact keys that seed the reachability closure.
    pub roots: Option<Vec<String>>,
    /// Artifact key patterns to ignore.
    pub ignore: Option<Vec<String>>,
    /// Cap on closure passes; defaults when absent.
    pub iteration_cap: Option<usize>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

/// Loads configuration from refscan.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<RefscanConfig>> {
    let path = root.join("refscan.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let cfg = toml::from_str(&content).context("Invalid refscan.toml")?;
    Ok(Some(cfg))
}

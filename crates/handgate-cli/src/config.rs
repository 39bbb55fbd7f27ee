//! Configuration file support
//!
//! ```toml
//! [gateway]
//! bind_addr = "0.0.0.0:7400"
//! control_addr = "127.0.0.1:7401"
//! data_addr = "127.0.0.1:7402"
//! gate = "shared"            # or "per-hand"
//!
//! [schema]
//! tracked = ["left_hand", "right_hand"]
//! ```

use anyhow::{bail, Context, Result};
use handgate_bridge::GatewayConfig;
use handgate_core::{SchemaEntry, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub schema: SchemaConfig,
}

/// Address patterns to accept besides `connect`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Tracked entity names, without the leading `/`
    pub tracked: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            tracked: vec!["left_hand".to_string(), "right_hand".to_string()],
        }
    }
}

impl SchemaConfig {
    /// Build the registry: `connect` plus every tracked entity
    pub fn registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::connect_only();
        for name in &self.tracked {
            if name.is_empty() || name.contains('/') {
                bail!("invalid tracked entity name: {:?}", name);
            }
            registry.register(SchemaEntry::tracked(name.as_str()));
        }
        Ok(registry)
    }
}

impl Config {
    /// Load from `path`, or from the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = default_config_file();
                if default.exists() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Get the default config file path
pub fn default_config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("handgate")
        .join("config.toml")
}

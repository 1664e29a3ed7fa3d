//! Configuration file structure (trellis.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize)]
pub struct ThemeConfig {
    /// Theme root, relative to the working directory
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    /// Output directory, relative to the theme root
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_true")]
    pub minify: bool,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub open: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            minify: true,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            open: true,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}
fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    3000
}
fn default_poll_interval_ms() -> u64 {
    300
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

//! Theme build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trellis_pipeline::{is_dev_mode, load_env, Builder, PipelineConfig};

use crate::config::load_config;

/// Run the build command.
pub async fn run(
    config_path: &Path,
    mode: &str,
    out_dir: Option<PathBuf>,
    minify: Option<bool>,
) -> Result<()> {
    let file_config = load_config(config_path)?;

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let env = load_env(mode, &cwd).context("Failed to load env files")?;
    let dev_mode = is_dev_mode(&env);

    tracing::info!(
        "Building theme in {} mode{}",
        mode,
        if dev_mode { " (APP_ENV=local)" } else { "" }
    );

    let config = PipelineConfig {
        theme_root: file_config.theme.root,
        out_dir: out_dir.unwrap_or(file_config.build.out_dir),
        dev_mode,
        minify: minify.unwrap_or(file_config.build.minify),
    };

    let result = Builder::new(config).build()?;

    tracing::info!(
        "Built {} pages, {} scripts and {} assets in {}ms",
        result.pages,
        result.scripts,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

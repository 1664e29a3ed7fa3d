//! Development server command.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use trellis_server::{DevServer, DevServerConfig};

use crate::config::load_config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let file_config = load_config(config_path)?;
    let port = port.unwrap_or(file_config.server.port);

    tracing::info!("Starting development server on port {}", port);

    let config = DevServerConfig {
        root: file_config.theme.root,
        port,
        open: open && file_config.server.open,
        poll_interval: Duration::from_millis(file_config.server.poll_interval_ms),
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}

//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::load_config;

/// Run the serve command.
pub async fn run(config_path: &Path, port: u16, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => {
            let file_config = load_config(config_path)?;
            file_config.theme.root.join(file_config.build.out_dir)
        }
    };

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'trellis build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let app = Router::new().fallback_service(ServeDir::new(&dir));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Port {} is unavailable", port))?;

    // Open browser
    let url = if dir.join("html/index.html").is_file() {
        format!("http://{}/html/index.html", addr)
    } else {
        format!("http://{}", addr)
    };
    let _ = open::that(&url);

    axum::serve(listener, app).await?;

    Ok(())
}

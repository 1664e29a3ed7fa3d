//! Scaffold a theme.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::load_config;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing theme...");

    let root = load_config(config_path)?.theme.root;

    for dir in ["src/html", "src/assets/js", "src/assets/css", "src/assets/images"] {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    write_scaffold(config_path, DEFAULT_CONFIG, yes)?;
    write_scaffold(&root.join("src/html/index.html"), DEFAULT_INDEX, yes)?;
    write_scaffold(&root.join("src/assets/js/menu.js"), DEFAULT_MENU_JS, yes)?;
    write_scaffold(&root.join("src/assets/css/style.css"), DEFAULT_CSS, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'trellis dev' to start the development server.");

    Ok(())
}

/// Write `contents` to `path` unless it exists and `overwrite` is false.
fn write_scaffold(path: &Path, contents: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Trellis Configuration

[theme]
# Theme root containing src/html and src/assets
root = "."

[build]
# Output directory, relative to the theme root
out_dir = "dist"

# Minify scripts and stylesheets
minify = true

[server]
# Dev server port (no fallback if taken)
port = 3000

# Open a browser on start
open = true

# Filesystem polling interval
poll_interval_ms = 300
"#;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Theme</title>
  <link rel="stylesheet" href="../assets/css/style.css">
</head>
<body>
  <header>
    <button id="nav-toggle" type="button" aria-label="Menu">&#9776;</button>
    <nav class="mainnav">
      <a href="index.html">Home</a>
    </nav>
  </header>
  <main>
    <h1>Welcome</h1>
  </main>
  <script type="module" src="../assets/js/menu.js"></script>
</body>
</html>
"#;

const DEFAULT_MENU_JS: &str = r#"document.addEventListener("DOMContentLoaded", () => {
  const toggle = document.getElementById("nav-toggle");
  const menu = document.querySelector(".mainnav");

  if (toggle && menu) {
    toggle.addEventListener("click", () => {
      menu.classList.toggle("open");
    });
  } else {
    console.log("nav-toggle or .mainnav not found");
  }
});
"#;

const DEFAULT_CSS: &str = r#".mainnav {
  display: none;
}

.mainnav.open {
  display: block;
}
"#;

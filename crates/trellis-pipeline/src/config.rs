//! Pipeline configuration and theme directory layout.

use std::path::{Component, Path, PathBuf};

/// Markup sources, relative to the theme root.
pub const HTML_SOURCE_DIR: &str = "src/html";

/// Script entry sources, relative to the theme root.
pub const JS_SOURCE_DIR: &str = "src/assets/js";

/// Static asset sources, relative to the theme root.
pub const ASSETS_SOURCE_DIR: &str = "src/assets";

/// Flattened markup destination, relative to the output directory.
pub const HTML_OUTPUT_DIR: &str = "html";

/// Configuration for running the asset pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Theme root directory
    pub theme_root: PathBuf,

    /// Output directory, relative to the theme root unless absolute
    pub out_dir: PathBuf,

    /// Local development mode. Keeps console calls and debugger statements.
    pub dev_mode: bool,

    /// Minify emitted scripts and stylesheets
    pub minify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            theme_root: PathBuf::from("."),
            out_dir: PathBuf::from("dist"),
            dev_mode: false,
            minify: true,
        }
    }
}

impl PipelineConfig {
    /// Resolve the directory layout for this configuration.
    pub fn layout(&self) -> ThemeLayout {
        ThemeLayout::new(&self.theme_root, &self.out_dir)
    }
}

/// Resolved source and output directories of a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayout {
    /// Theme root directory
    pub root: PathBuf,

    /// Output directory
    pub out_dir: PathBuf,
}

impl ThemeLayout {
    /// Create a layout. A relative `out_dir` is resolved against `root`.
    pub fn new(root: &Path, out_dir: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            out_dir: root.join(out_dir),
        }
    }

    /// `<theme>/src`, the target of the `@/` alias.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.root.join(HTML_SOURCE_DIR)
    }

    pub fn js_dir(&self) -> PathBuf {
        self.root.join(JS_SOURCE_DIR)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_SOURCE_DIR)
    }

    /// Where the bundler stages markup before relocation (`<out>/src/html`).
    pub fn staged_html_dir(&self) -> PathBuf {
        self.out_dir.join(HTML_SOURCE_DIR)
    }

    /// Final markup location (`<out>/html`).
    pub fn output_html_dir(&self) -> PathBuf {
        self.out_dir.join(HTML_OUTPUT_DIR)
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_out_dir_against_root() {
        let layout = ThemeLayout::new(Path::new("themes/flora"), Path::new("dist"));

        assert_eq!(layout.out_dir, PathBuf::from("themes/flora/dist"));
        assert_eq!(
            layout.staged_html_dir(),
            PathBuf::from("themes/flora/dist/src/html")
        );
        assert_eq!(
            layout.output_html_dir(),
            PathBuf::from("themes/flora/dist/html")
        );
        assert_eq!(layout.js_dir(), PathBuf::from("themes/flora/src/assets/js"));
    }

    #[test]
    fn keeps_absolute_out_dir() {
        let layout = ThemeLayout::new(Path::new("themes/flora"), Path::new("/tmp/out"));
        assert_eq!(layout.out_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn defaults_to_production() {
        let config = PipelineConfig::default();
        assert!(!config.dev_mode);
        assert!(config.minify);
    }

    #[test]
    fn normalizes_lexically() {
        assert_eq!(
            normalize(Path::new("/theme/src/html/../assets/./css/app.css")),
            PathBuf::from("/theme/src/assets/css/app.css")
        );
        assert_eq!(
            normalize(Path::new("/work/theme/../sibling")),
            PathBuf::from("/work/sibling")
        );
    }
}

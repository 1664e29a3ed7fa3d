//! Output routing: where a produced asset lands in the output directory.

use std::path::{Path, PathBuf};

/// A produced file's logical name and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    /// File name without extension (e.g. "logo")
    pub name: String,

    /// Extension, with or without the leading dot (e.g. "svg" or ".svg")
    pub ext: String,
}

impl AssetDescriptor {
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
        }
    }

    /// Describe a file by its path. Files without an extension get an empty one.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::new(name, ext)
    }

    /// Extension without the leading dot.
    fn bare_ext(&self) -> &str {
        self.ext.strip_prefix('.').unwrap_or(&self.ext)
    }

    /// `<name><ext>`, with the dot restored.
    fn file_name(&self) -> String {
        match self.bare_ext() {
            "" => self.name.clone(),
            ext => format!("{}.{}", self.name, ext),
        }
    }
}

/// Kind of emitted asset, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Css,
    Js,
    Font,
    Image,
    Other,
}

impl AssetClass {
    /// Classify an extension (without leading dot), ignoring case.
    pub fn from_ext(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Self::Css,
            "js" => Self::Js,
            "woff" | "woff2" | "ttf" | "eot" | "otf" => Self::Font,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => Self::Image,
            _ => Self::Other,
        }
    }

    /// Output subdirectory for this class.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Css => "assets/css",
            Self::Js => "assets/js",
            Self::Font => "assets/fonts",
            Self::Image => "assets/images",
            Self::Other => "assets",
        }
    }
}

/// Destination of a produced asset, relative to the output directory.
pub fn route_output(asset: &AssetDescriptor) -> PathBuf {
    let class = AssetClass::from_ext(asset.bare_ext());
    Path::new(class.dir()).join(asset.file_name())
}

/// Destination of a script entry, relative to the output directory.
pub fn entry_file_name(name: &str) -> PathBuf {
    Path::new(AssetClass::Js.dir()).join(format!("{name}.js"))
}

//! Input discovery.
//!
//! Scans a source directory for entry files and maps each logical entry name
//! (the file name without its extension) to an absolute path.

use std::collections::BTreeMap;
use std::path::{self, Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ThemeLayout;

/// Discovered build inputs keyed by logical name.
pub type EntryMap = BTreeMap<String, PathBuf>;

/// Entries for one build, one map per source kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    /// Markup entries (`src/html/*.html`)
    pub markup: EntryMap,

    /// Script entries (`src/assets/js/*.js`)
    pub scripts: EntryMap,
}

impl EntrySet {
    pub fn len(&self) -> usize {
        self.markup.len() + self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty() && self.scripts.is_empty()
    }
}

/// Errors that can occur during discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Map every direct child file of `dir` ending in `suffix` to its absolute path.
///
/// Subdirectories are not descended into and are never matched.
pub fn discover(dir: &Path, suffix: &str) -> Result<EntryMap, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut entries = EntryMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| DiscoveryError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };

        let name = match file_name.strip_suffix(suffix) {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };

        let absolute = path::absolute(entry.path()).map_err(|e| DiscoveryError::Io {
            path: entry.path().to_path_buf(),
            source: e,
        })?;

        entries.insert(name.to_string(), absolute);
    }

    tracing::debug!("Discovered {} {} entries in {}", entries.len(), suffix, dir.display());

    Ok(entries)
}

/// Discover markup and script entries of a theme.
pub fn discover_entries(layout: &ThemeLayout) -> Result<EntrySet, DiscoveryError> {
    Ok(EntrySet {
        markup: discover(&layout.html_dir(), ".html")?,
        scripts: discover(&layout.js_dir(), ".js")?,
    })
}

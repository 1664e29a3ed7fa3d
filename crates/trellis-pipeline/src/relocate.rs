//! Post-build relocation of staged markup.
//!
//! The bundler writes markup under `<out>/src/html`, mirroring the source tree.
//! Relocation flattens it into `<out>/html` and removes `<out>/src`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{HTML_OUTPUT_DIR, HTML_SOURCE_DIR};

/// Errors that can occur while relocating output.
#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocationError {
    fn at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a relocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationReport {
    /// Nothing was staged; the tree was left untouched.
    Skipped,

    /// Staged entries were moved and the staging tree removed.
    Moved {
        /// Number of entries moved
        moved: usize,
        /// Number of moves that replaced an existing file
        overwritten: usize,
    },
}

/// Move `<out_dir>/src/html/*` to `<out_dir>/html/` and delete `<out_dir>/src`.
///
/// Does nothing when `<out_dir>/src/html` does not exist. Entries are moved in
/// directory enumeration order and replace same-named files at the destination.
pub fn relocate_markup(out_dir: &Path) -> Result<RelocationReport, RelocationError> {
    relocate(out_dir, Path::new(HTML_SOURCE_DIR), Path::new(HTML_OUTPUT_DIR))
}

/// Move every entry of `out_dir/nested` into `out_dir/dest`, then remove the
/// first component of `nested` from `out_dir`.
pub fn relocate(
    out_dir: &Path,
    nested: &Path,
    dest: &Path,
) -> Result<RelocationReport, RelocationError> {
    let source_dir = out_dir.join(nested);
    if !source_dir.is_dir() {
        tracing::debug!("No staged output at {}", source_dir.display());
        return Ok(RelocationReport::Skipped);
    }

    let dest_dir = out_dir.join(dest);
    fs::create_dir_all(&dest_dir).map_err(RelocationError::at(&dest_dir))?;

    let mut moved = 0;
    let mut overwritten = 0;

    for entry in fs::read_dir(&source_dir).map_err(RelocationError::at(&source_dir))? {
        let entry = entry.map_err(RelocationError::at(&source_dir))?;
        let from = entry.path();
        let to = dest_dir.join(entry.file_name());

        if to.exists() {
            tracing::warn!("Overwriting {} with {}", to.display(), from.display());
            overwritten += 1;
        }

        fs::rename(&from, &to).map_err(RelocationError::at(&from))?;
        moved += 1;
    }

    let staging_root = match nested.components().next() {
        Some(first) => out_dir.join(first),
        None => source_dir,
    };

    match fs::remove_dir_all(&staging_root) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(RelocationError::at(&staging_root)(e)),
    }

    tracing::info!("Relocated {} file(s) to {}", moved, dest_dir.display());

    Ok(RelocationReport::Moved { moved, overwritten })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn flattens_staged_markup() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(dist.join("src/html")).unwrap();
        fs::create_dir_all(dist.join("html")).unwrap();
        fs::write(dist.join("src/html/index.html"), "<h1>Home</h1>").unwrap();

        let report = relocate_markup(&dist).unwrap();

        assert_eq!(
            report,
            RelocationReport::Moved {
                moved: 1,
                overwritten: 0
            }
        );
        assert_eq!(
            fs::read_to_string(dist.join("html/index.html")).unwrap(),
            "<h1>Home</h1>"
        );
        assert!(!dist.join("src").exists());
    }

    #[test]
    fn creates_destination_directory() {
        let temp = tempdir().unwrap();
        let dist = temp.path();
        fs::create_dir_all(dist.join("src/html")).unwrap();
        fs::write(dist.join("src/html/a.html"), "a").unwrap();
        fs::write(dist.join("src/html/b.html"), "b").unwrap();

        relocate_markup(dist).unwrap();

        assert!(dist.join("html/a.html").is_file());
        assert!(dist.join("html/b.html").is_file());
    }

    #[test]
    fn overwrites_on_collision() {
        let temp = tempdir().unwrap();
        let dist = temp.path();
        fs::create_dir_all(dist.join("src/html")).unwrap();
        fs::create_dir_all(dist.join("html")).unwrap();
        fs::write(dist.join("html/index.html"), "old").unwrap();
        fs::write(dist.join("src/html/index.html"), "new").unwrap();

        let report = relocate_markup(dist).unwrap();

        assert_eq!(
            report,
            RelocationReport::Moved {
                moved: 1,
                overwritten: 1
            }
        );
        assert_eq!(fs::read_to_string(dist.join("html/index.html")).unwrap(), "new");
    }

    #[test]
    fn removes_whole_staging_subtree() {
        let temp = tempdir().unwrap();
        let dist = temp.path();
        fs::create_dir_all(dist.join("src/html")).unwrap();
        fs::create_dir_all(dist.join("src/other")).unwrap();
        fs::write(dist.join("src/other/leftover.txt"), "").unwrap();
        fs::write(dist.join("src/html/index.html"), "").unwrap();

        relocate_markup(dist).unwrap();

        assert!(!dist.join("src").exists());
    }

    #[test]
    fn missing_staging_directory_is_a_no_op() {
        let temp = tempdir().unwrap();
        let dist = temp.path();
        fs::create_dir_all(dist.join("assets/js")).unwrap();

        assert_eq!(relocate_markup(dist).unwrap(), RelocationReport::Skipped);
        assert!(dist.join("assets/js").exists());
        assert!(!dist.join("html").exists());
    }

    #[test]
    fn relocation_is_idempotent() {
        let temp = tempdir().unwrap();
        let dist = temp.path();
        fs::create_dir_all(dist.join("src/html")).unwrap();
        fs::write(dist.join("src/html/index.html"), "x").unwrap();

        relocate_markup(dist).unwrap();
        assert_eq!(relocate_markup(dist).unwrap(), RelocationReport::Skipped);
        assert!(dist.join("html/index.html").is_file());
    }
}

//! Theme builder: runs a bundler through the pipeline phases.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::bundler::StaticBundler;
use crate::config::{normalize, PipelineConfig};
use crate::discovery::DiscoveryError;
use crate::pipeline::{AssetPipeline, Bundler};
use crate::relocate::{RelocationError, RelocationReport};

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of markup pages emitted
    pub pages: usize,

    /// Number of script entries emitted
    pub scripts: usize,

    /// Number of static assets copied
    pub assets: usize,

    /// Number of files moved by relocation
    pub relocated: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Relocation(#[from] RelocationError),

    #[error("Output directory {out_dir} would overwrite theme root {root}")]
    OutDirContainsRoot { out_dir: PathBuf, root: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds a theme: discover, bundle, then finalize.
pub struct Builder {
    pipeline: AssetPipeline,
    bundler: Box<dyn Bundler>,
}

impl Builder {
    /// Create a builder using the built-in [`StaticBundler`].
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_bundler(config, StaticBundler::new())
    }

    /// Create a builder driving a custom bundler.
    pub fn with_bundler(config: PipelineConfig, bundler: impl Bundler + 'static) -> Self {
        Self {
            pipeline: AssetPipeline::new(config),
            bundler: Box::new(bundler),
        }
    }

    /// Build the theme.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let out_dir = self.pipeline.layout().out_dir.clone();

        tracing::info!(
            "Building {} ({} mode, {} bundler)",
            self.pipeline.layout().root.display(),
            if self.pipeline.config().dev_mode {
                "local"
            } else {
                "production"
            },
            self.bundler.name()
        );

        let entries = self.pipeline.discover()?;

        self.empty_out_dir()?;

        let emitted = self.bundler.bundle(&self.pipeline, &entries)?;

        let relocated = match self.pipeline.finalize()? {
            RelocationReport::Moved { moved, .. } => moved,
            RelocationReport::Skipped => 0,
        };

        Ok(BuildResult {
            pages: emitted.pages,
            scripts: emitted.scripts,
            assets: emitted.assets,
            relocated,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: out_dir,
        })
    }

    /// Clear the output directory, but only when it lives inside the theme root.
    ///
    /// An output directory that is the theme root or one of its ancestors is
    /// refused, since staging and relocation would write over the sources.
    fn empty_out_dir(&self) -> Result<(), BuildError> {
        let layout = self.pipeline.layout();
        let out_dir = &layout.out_dir;

        let root = resolve(&layout.root)?;
        let resolved = resolve(out_dir)?;
        if root.starts_with(&resolved) {
            return Err(BuildError::OutDirContainsRoot {
                out_dir: resolved,
                root,
            });
        }

        if !resolved.starts_with(&root) {
            tracing::warn!("{} is outside the theme root; not emptying it", out_dir.display());
            return Ok(());
        }

        match fs::remove_dir_all(out_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::Write {
                path: out_dir.clone(),
                source: e,
            }),
        }
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn resolve(path: &Path) -> Result<PathBuf, BuildError> {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|e| BuildError::Read {
            path: path.to_path_buf(),
            source: e,
        })
}

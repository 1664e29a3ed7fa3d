//! The three-phase asset pipeline.
//!
//! A bundler drives a build through three phases, strictly in order:
//!
//! 1. [`AssetPipeline::discover`] at configuration load, producing the entries.
//! 2. Emission: the bundler names every output with
//!    [`AssetPipeline::route_output`] and passes every markup file through
//!    [`AssetPipeline::transform_markup`].
//! 3. [`AssetPipeline::finalize`] once, after the bundler has written everything.

use std::path::PathBuf;

use crate::builder::BuildError;
use crate::config::{PipelineConfig, ThemeLayout};
use crate::discovery::{discover_entries, DiscoveryError, EntrySet};
use crate::markup::finalize_markup;
use crate::minify::ScriptOptions;
use crate::relocate::{relocate_markup, RelocationError, RelocationReport};
use crate::route::{route_output, AssetDescriptor};

/// Counts of what a bundler wrote to the staging directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Markup pages written
    pub pages: usize,

    /// Script entries written
    pub scripts: usize,

    /// Static assets copied
    pub assets: usize,
}

/// Anything that can turn an entry set into files in the output directory.
pub trait Bundler: Send + Sync {
    /// Bundler identifier (e.g. "static")
    fn name(&self) -> &'static str;

    /// Emit every entry into `pipeline.layout().out_dir`.
    ///
    /// Implementations must use the pipeline's routing and markup hooks and must
    /// not return before all of their writes are complete.
    fn bundle(
        &self,
        pipeline: &AssetPipeline,
        entries: &EntrySet,
    ) -> Result<EmitReport, BuildError>;
}

/// Hooks shared by every bundler adapter.
#[derive(Debug, Clone)]
pub struct AssetPipeline {
    config: PipelineConfig,
    layout: ThemeLayout,
}

impl AssetPipeline {
    /// Create a pipeline for the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let layout = config.layout();
        Self { config, layout }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &ThemeLayout {
        &self.layout
    }

    /// How scripts should be processed in this build.
    pub fn script_options(&self) -> ScriptOptions {
        ScriptOptions::for_mode(self.config.dev_mode, self.config.minify)
    }

    /// Phase 1: find markup and script entries.
    pub fn discover(&self) -> Result<EntrySet, DiscoveryError> {
        let entries = discover_entries(&self.layout)?;
        tracing::info!(
            "Found {} markup and {} script entries",
            entries.markup.len(),
            entries.scripts.len()
        );
        Ok(entries)
    }

    /// Destination of an emitted asset, relative to the output directory.
    pub fn route_output(&self, asset: &AssetDescriptor) -> PathBuf {
        route_output(asset)
    }

    /// Phase 2 hook for every markup file.
    pub fn transform_markup(&self, html: &str) -> String {
        finalize_markup(html)
    }

    /// Phase 3: flatten staged markup into its final location.
    pub fn finalize(&self) -> Result<RelocationReport, RelocationError> {
        relocate_markup(&self.layout.out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn pipeline_at(root: &Path) -> AssetPipeline {
        AssetPipeline::new(PipelineConfig {
            theme_root: root.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn discover_fails_without_sources() {
        let temp = tempdir().unwrap();
        let err = pipeline_at(temp.path()).discover().unwrap_err();

        assert!(matches!(err, DiscoveryError::DirectoryNotFound(_)));
    }

    #[test]
    fn finalize_relocates_into_output_dir() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline_at(temp.path());
        let staged = pipeline.layout().staged_html_dir();
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("index.html"), "").unwrap();

        pipeline.finalize().unwrap();

        assert!(temp.path().join("dist/html/index.html").is_file());
        assert!(!temp.path().join("dist/src").exists());
    }

    #[test]
    fn script_options_follow_mode() {
        let temp = tempdir().unwrap();
        let mut config = PipelineConfig {
            theme_root: temp.path().to_path_buf(),
            ..Default::default()
        };
        assert!(AssetPipeline::new(config.clone()).script_options().drop_diagnostics);

        config.dev_mode = true;
        assert!(!AssetPipeline::new(config).script_options().drop_diagnostics);
    }
}

//! Asset pipeline for themed websites.
//!
//! Discovers markup and script entries, routes emitted assets into the output
//! tree, rewrites generated markup, and relocates staged HTML once the bundler
//! is done.

pub mod builder;
pub mod bundler;
pub mod config;
pub mod discovery;
pub mod env;
pub mod markup;
pub mod minify;
pub mod pipeline;
pub mod relocate;
pub mod route;

pub use builder::{BuildError, BuildResult, Builder};
pub use bundler::StaticBundler;
pub use config::{PipelineConfig, ThemeLayout};
pub use discovery::{discover, discover_entries, DiscoveryError, EntryMap, EntrySet};
pub use env::{is_dev_mode, load_env, load_env_files, EnvError};
pub use markup::{finalize_markup, fix_asset_paths, strip_crossorigin};
pub use minify::{minify_css, process_script, MinifyError, ScriptOptions};
pub use pipeline::{AssetPipeline, Bundler, EmitReport};
pub use relocate::{relocate, relocate_markup, RelocationError, RelocationReport};
pub use route::{entry_file_name, route_output, AssetClass, AssetDescriptor};

//! Built-in bundler that emits theme sources in Vite's output layout.
//!
//! Scripts go to `assets/js/<name>.js`, static assets are routed by extension,
//! and markup is staged under `<out>/src/html` with asset references rewritten
//! relative to that staging location.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::{Captures, Regex};
use walkdir::WalkDir;

use crate::builder::BuildError;
use crate::config::{normalize, HTML_SOURCE_DIR};
use crate::discovery::{EntryMap, EntrySet};
use crate::minify::{minify_css, process_script};
use crate::pipeline::{AssetPipeline, Bundler, EmitReport};
use crate::route::{entry_file_name, AssetClass, AssetDescriptor};

/// Sources that need a preprocessor and are never copied as-is.
const PREPROCESSOR_EXTENSIONS: &[&str] = &["scss", "sass", "less"];

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s(?:src|href)=)"([^"]*)""#).expect("Invalid reference regex")
});

/// Copies, minifies and stages theme sources without a module graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticBundler;

impl StaticBundler {
    pub fn new() -> Self {
        Self
    }
}

impl Bundler for StaticBundler {
    fn name(&self) -> &'static str {
        "static"
    }

    fn bundle(
        &self,
        pipeline: &AssetPipeline,
        entries: &EntrySet,
    ) -> Result<EmitReport, BuildError> {
        let scripts = emit_scripts(pipeline, &entries.scripts)?;
        let assets = emit_assets(pipeline, &entries.scripts)?;
        let pages = emit_markup(pipeline, entries)?;

        Ok(EmitReport {
            pages,
            scripts,
            assets,
        })
    }
}

/// Process and write every script entry.
fn emit_scripts(pipeline: &AssetPipeline, scripts: &EntryMap) -> Result<usize, BuildError> {
    let out_dir = &pipeline.layout().out_dir;
    let options = pipeline.script_options();

    for (name, source_path) in scripts {
        let source = read(source_path)?;
        let code = process_script(&source, options).unwrap_or_else(|e| {
            tracing::warn!("Emitting {} unprocessed: {}", source_path.display(), e);
            source
        });

        write(&out_dir.join(entry_file_name(name)), code)?;
    }

    Ok(scripts.len())
}

/// Copy every static asset that is not a script entry.
fn emit_assets(pipeline: &AssetPipeline, scripts: &EntryMap) -> Result<usize, BuildError> {
    let layout = pipeline.layout();
    let assets_dir = layout.assets_dir();
    if !assets_dir.is_dir() {
        return Ok(0);
    }

    let js_dir = layout.js_dir();
    let mut planned: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(&assets_dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable asset: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let asset = AssetDescriptor::from_path(path);
        if is_preprocessor_source(&asset) {
            tracing::debug!("Skipping preprocessor source {}", path.display());
            continue;
        }
        if is_script_entry(path, &asset, &js_dir, scripts) {
            continue;
        }

        let routed = pipeline.route_output(&asset);
        if scripts.contains_key(&asset.name) && routed == entry_file_name(&asset.name) {
            tracing::warn!(
                "{} routes onto script entry {}; keeping the entry",
                path.display(),
                routed.display()
            );
            continue;
        }

        let dest = layout.out_dir.join(routed);

        if let Some(previous) = planned.insert(dest.clone(), path.to_path_buf()) {
            tracing::warn!(
                "{} and {} both route to {}; keeping the latter",
                previous.display(),
                path.display(),
                dest.display()
            );
        }
    }

    let minify = pipeline.config().minify;

    planned
        .par_iter()
        .map(|(dest, source)| copy_asset(source, dest, minify))
        .collect::<Result<Vec<()>, BuildError>>()?;

    Ok(planned.len())
}

/// Direct children of the script directory are emitted by [`emit_scripts`].
fn is_script_entry(
    path: &Path,
    asset: &AssetDescriptor,
    js_dir: &Path,
    scripts: &EntryMap,
) -> bool {
    path.parent() == Some(js_dir)
        && AssetClass::from_ext(&asset.ext) == AssetClass::Js
        && scripts.contains_key(&asset.name)
}

fn is_preprocessor_source(asset: &AssetDescriptor) -> bool {
    let ext = asset.ext.trim_start_matches('.').to_ascii_lowercase();
    PREPROCESSOR_EXTENSIONS.contains(&ext.as_str())
}

fn copy_asset(source: &Path, dest: &Path, minify: bool) -> Result<(), BuildError> {
    let is_css = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| AssetClass::from_ext(e) == AssetClass::Css);

    if minify && is_css {
        let css = read(source)?;
        let css = minify_css(&css).unwrap_or_else(|e| {
            tracing::warn!("Emitting {} unminified: {}", source.display(), e);
            css
        });
        return write(dest, css);
    }

    ensure_parent(dest)?;
    fs::copy(source, dest).map_err(|e| BuildError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Rewrite, finalize and stage every markup entry.
fn emit_markup(pipeline: &AssetPipeline, entries: &EntrySet) -> Result<usize, BuildError> {
    let layout = pipeline.layout();
    let staged_dir = layout.staged_html_dir();
    let rewriter = ReferenceRewriter::new(pipeline, &entries.scripts)?;

    for source_path in entries.markup.values() {
        let Some(file_name) = source_path.file_name() else {
            continue;
        };

        let html = read(source_path)?;
        let base = source_path.parent().unwrap_or(Path::new(""));
        let html = rewriter.rewrite(&html, base);
        let html = pipeline.transform_markup(&html);

        write(&staged_dir.join(file_name), html)?;
    }

    Ok(entries.markup.len())
}

/// Points relative asset references at their emitted location.
struct ReferenceRewriter<'a> {
    src_dir: PathBuf,
    assets_dir: PathBuf,
    js_dir: PathBuf,
    scripts: &'a EntryMap,
    pipeline: &'a AssetPipeline,
    /// `../` repeated once per component of the staging directory
    up: String,
}

impl<'a> ReferenceRewriter<'a> {
    fn new(pipeline: &'a AssetPipeline, scripts: &'a EntryMap) -> Result<Self, BuildError> {
        let layout = pipeline.layout();
        let absolute = |p: PathBuf| {
            std::path::absolute(&p)
                .map(|a| normalize(&a))
                .map_err(|e| BuildError::Read { path: p, source: e })
        };

        Ok(Self {
            src_dir: absolute(layout.src_dir())?,
            assets_dir: absolute(layout.assets_dir())?,
            js_dir: absolute(layout.js_dir())?,
            scripts,
            pipeline,
            up: "../".repeat(Path::new(HTML_SOURCE_DIR).components().count()),
        })
    }

    fn rewrite(&self, html: &str, base: &Path) -> String {
        REFERENCE_RE
            .replace_all(html, |caps: &Captures| {
                let value = &caps[2];
                match self.resolve(value, base) {
                    Some(routed) => format!("{}\"{}{}\"", &caps[1], self.up, routed),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Output path (with `/` separators and any query or fragment) for a
    /// reference into the assets tree, or `None` to leave it alone.
    fn resolve(&self, value: &str, base: &Path) -> Option<String> {
        if is_external(value) {
            return None;
        }

        let split = value.find(['?', '#']).unwrap_or(value.len());
        let (path_part, suffix) = value.split_at(split);

        let target = match path_part.strip_prefix("@/") {
            Some(rest) => self.src_dir.join(rest),
            None => base.join(path_part),
        };
        let target = normalize(&target);

        if !target.starts_with(&self.assets_dir) {
            return None;
        }

        let asset = AssetDescriptor::from_path(&target);
        let routed = if target.parent() == Some(self.js_dir.as_path())
            && self.scripts.contains_key(&asset.name)
            && AssetClass::from_ext(&asset.ext) == AssetClass::Js
        {
            entry_file_name(&asset.name)
        } else if target.is_file() && !is_preprocessor_source(&asset) {
            self.pipeline.route_output(&asset)
        } else {
            tracing::debug!("Leaving unresolved reference {}", value);
            return None;
        };

        Some(format!("{}{}", to_url(&routed), suffix))
    }
}

fn is_external(value: &str) -> bool {
    value.is_empty()
        || value.starts_with('/')
        || value.starts_with('#')
        || value.contains("://")
        || ["data:", "mailto:", "tel:", "javascript:"]
            .iter()
            .any(|scheme| value.starts_with(scheme))
}

fn to_url(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|e| BuildError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn ensure_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn write(path: &Path, contents: String) -> Result<(), BuildError> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|e| BuildError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn theme() -> (tempfile::TempDir, AssetPipeline) {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/html")).unwrap();
        fs::create_dir_all(root.join("src/assets/js")).unwrap();
        fs::create_dir_all(root.join("src/assets/css")).unwrap();
        fs::create_dir_all(root.join("src/assets/images")).unwrap();
        fs::create_dir_all(root.join("src/assets/scss")).unwrap();
        fs::write(root.join("src/assets/js/menu.js"), "console.log('hi');\n").unwrap();
        fs::write(root.join("src/assets/css/app.css"), ".a { color: red; }\n").unwrap();
        fs::write(root.join("src/assets/images/logo.svg"), "<svg/>").unwrap();
        fs::write(root.join("src/assets/scss/main.scss"), "$c: red;").unwrap();

        let pipeline = AssetPipeline::new(PipelineConfig {
            theme_root: root.to_path_buf(),
            ..Default::default()
        });
        (temp, pipeline)
    }

    #[test]
    fn rewrites_asset_references_relative_to_staging() {
        let (temp, pipeline) = theme();
        let entries = pipeline.discover().unwrap();
        let rewriter = ReferenceRewriter::new(&pipeline, &entries.scripts).unwrap();
        let base = std::path::absolute(temp.path().join("src/html")).unwrap();

        let html = concat!(
            r#"<link rel="stylesheet" href="../assets/css/app.css?v=2">"#,
            r#"<img src="@/assets/images/logo.svg">"#,
            r#"<script type="module" src="../assets/js/menu.js"></script>"#,
        );

        assert_eq!(
            rewriter.rewrite(html, &base),
            concat!(
                r#"<link rel="stylesheet" href="../../assets/css/app.css?v=2">"#,
                r#"<img src="../../assets/images/logo.svg">"#,
                r#"<script type="module" src="../../assets/js/menu.js"></script>"#,
            )
        );
    }

    #[test]
    fn leaves_external_and_unknown_references() {
        let (temp, pipeline) = theme();
        let entries = pipeline.discover().unwrap();
        let rewriter = ReferenceRewriter::new(&pipeline, &entries.scripts).unwrap();
        let base = std::path::absolute(temp.path().join("src/html")).unwrap();

        let html = concat!(
            r#"<a href="https://example.com/x.css">x</a>"#,
            r##"<a href="#top">top</a>"##,
            r#"<a href="about.html">about</a>"#,
            r#"<img src="../assets/images/missing.png">"#,
        );

        assert_eq!(rewriter.rewrite(html, &base), html);
    }

    #[test]
    fn emits_assets_by_class() {
        let (temp, pipeline) = theme();

        let entries = pipeline.discover().unwrap();
        let count = emit_assets(&pipeline, &entries.scripts).unwrap();

        let dist = temp.path().join("dist");
        assert_eq!(count, 2);
        assert!(dist.join("assets/css/app.css").is_file());
        assert!(dist.join("assets/images/logo.svg").is_file());
        assert!(!dist.join("assets/main.scss").exists());
        assert!(!dist.join("assets/js/menu.js").exists());
    }

    #[test]
    fn bundles_into_staging_layout() {
        let (temp, pipeline) = theme();
        fs::write(
            temp.path().join("src/html/index.html"),
            r#"<body><script type="module" crossorigin src="../assets/js/menu.js"></script></body>"#,
        )
        .unwrap();
        let entries = pipeline.discover().unwrap();

        let report = StaticBundler.bundle(&pipeline, &entries).unwrap();

        let dist = temp.path().join("dist");
        assert_eq!(
            report,
            EmitReport {
                pages: 1,
                scripts: 1,
                assets: 2
            }
        );
        assert_eq!(
            fs::read_to_string(dist.join("src/html/index.html")).unwrap(),
            r#"<body><script type="module" src="../assets/js/menu.js"></script></body>"#
        );
        let menu = fs::read_to_string(dist.join("assets/js/menu.js")).unwrap();
        assert!(!menu.contains("console"));
    }

    #[test]
    fn copies_nested_scripts_that_pages_reference() {
        let (temp, pipeline) = theme();
        fs::create_dir_all(temp.path().join("src/assets/js/lib")).unwrap();
        fs::write(temp.path().join("src/assets/js/lib/util.js"), "export const x = 1;\n").unwrap();
        fs::write(
            temp.path().join("src/html/index.html"),
            r#"<script src="../assets/js/lib/util.js"></script>"#,
        )
        .unwrap();
        let entries = pipeline.discover().unwrap();

        let report = StaticBundler.bundle(&pipeline, &entries).unwrap();

        let dist = temp.path().join("dist");
        assert_eq!(report.assets, 3);
        assert_eq!(
            fs::read_to_string(dist.join("src/html/index.html")).unwrap(),
            r#"<script src="../assets/js/util.js"></script>"#
        );
        assert_eq!(
            fs::read_to_string(dist.join("assets/js/util.js")).unwrap(),
            "export const x = 1;\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn skips_unreadable_assets_and_copies_the_rest() {
        let (temp, pipeline) = theme();
        std::os::unix::fs::symlink(
            temp.path().join("nowhere.png"),
            temp.path().join("src/assets/images/broken.png"),
        )
        .unwrap();
        let entries = pipeline.discover().unwrap();

        let count = emit_assets(&pipeline, &entries.scripts).unwrap();

        assert_eq!(count, 2);
        assert!(temp.path().join("dist/assets/images/logo.svg").is_file());
    }

    #[test]
    fn entry_scripts_win_over_nested_namesakes() {
        let (temp, pipeline) = theme();
        fs::create_dir_all(temp.path().join("src/assets/js/vendor")).unwrap();
        fs::write(temp.path().join("src/assets/js/vendor/menu.js"), "vendored();\n").unwrap();
        let entries = pipeline.discover().unwrap();

        StaticBundler.bundle(&pipeline, &entries).unwrap();

        let menu = fs::read_to_string(temp.path().join("dist/assets/js/menu.js")).unwrap();
        assert!(!menu.contains("vendored"));
    }

    #[test]
    fn leaves_preprocessor_references() {
        let (temp, pipeline) = theme();
        let entries = pipeline.discover().unwrap();
        let rewriter = ReferenceRewriter::new(&pipeline, &entries.scripts).unwrap();
        let base = std::path::absolute(temp.path().join("src/html")).unwrap();

        let html = r#"<link rel="stylesheet" href="../assets/scss/main.scss">"#;

        assert_eq!(rewriter.rewrite(html, &base), html);
    }
}

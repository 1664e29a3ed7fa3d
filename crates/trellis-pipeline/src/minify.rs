//! Script and stylesheet processing.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::{MangleOptions, MangleOptionsKeepNames};
use oxc::minifier::{CompressOptions, CompressOptionsKeepNames, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// How an emitted script is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Minify and mangle locals. Function and class names are kept.
    pub minify: bool,

    /// Remove `console.*` calls and `debugger` statements.
    pub drop_diagnostics: bool,
}

impl ScriptOptions {
    /// Options for a build in the given mode.
    pub fn for_mode(dev_mode: bool, minify: bool) -> Self {
        Self {
            minify,
            drop_diagnostics: !dev_mode,
        }
    }
}

/// Errors from script or stylesheet processing.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    #[error("JS parse error: {0}")]
    Script(String),

    #[error("CSS error: {0}")]
    Style(String),
}

/// Process a script module.
///
/// Returns the source unchanged when there is nothing to do.
pub fn process_script(source: &str, options: ScriptOptions) -> Result<String, MinifyError> {
    if !options.minify && !options.drop_diagnostics {
        return Ok(source.to_string());
    }

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(MinifyError::Script(error.to_string()));
    }
    let mut program = ret.program;

    let compress = if options.minify {
        CompressOptions {
            drop_console: options.drop_diagnostics,
            drop_debugger: options.drop_diagnostics,
            keep_names: CompressOptionsKeepNames::all_true(),
            ..CompressOptions::smallest()
        }
    } else {
        CompressOptions {
            drop_console: options.drop_diagnostics,
            drop_debugger: options.drop_diagnostics,
            keep_names: CompressOptionsKeepNames::all_true(),
            ..CompressOptions::safest()
        }
    };

    let mangle = options.minify.then(|| MangleOptions {
        keep_names: MangleOptionsKeepNames::all_true(),
        ..MangleOptions::default()
    });

    let ret = Minifier::new(MinifierOptions {
        mangle,
        compress: Some(compress),
    })
    .minify(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: options.minify,
            comments: if options.minify {
                CommentOptions::disabled()
            } else {
                CommentOptions::default()
            },
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;

    Ok(code)
}

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, MinifyError> {
    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| MinifyError::Style(e.to_string()))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| MinifyError::Style(e.to_string()))?;

    Ok(minified.code)
}

//! Build mode and dotenv loading.
//!
//! Files are read in the order `.env`, `.env.local`, `.env.<mode>`,
//! `.env.<mode>.local`; later files win, and variables already present in the
//! process environment win over all of them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Variable that selects local development behaviour.
pub const APP_ENV: &str = "APP_ENV";

/// Value of [`APP_ENV`] that enables dev mode.
pub const LOCAL: &str = "local";

/// Errors that can occur while loading env files.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Env files consulted for `mode`, lowest precedence first.
pub fn env_files(mode: &str) -> [String; 4] {
    [
        ".env".to_string(),
        ".env.local".to_string(),
        format!(".env.{mode}"),
        format!(".env.{mode}.local"),
    ]
}

/// Load variables for `mode` from the env files in `dir`, then overlay the
/// process environment.
pub fn load_env(mode: &str, dir: &Path) -> Result<HashMap<String, String>, EnvError> {
    let mut vars = load_env_files(mode, dir)?;
    vars.extend(process_env());
    Ok(vars)
}

/// Merge the env files for `mode` in `dir` without consulting the process
/// environment.
pub fn load_env_files(mode: &str, dir: &Path) -> Result<HashMap<String, String>, EnvError> {
    let mut vars = HashMap::new();

    for name in env_files(mode) {
        let path = dir.join(&name);
        if !path.is_file() {
            continue;
        }

        let parse_error = |source| EnvError::Parse {
            path: path.clone(),
            source,
        };

        for item in dotenvy::from_path_iter(&path).map_err(parse_error)? {
            let (key, value) = item.map_err(parse_error)?;
            vars.insert(key, value);
        }

        tracing::debug!("Loaded {}", path.display());
    }

    Ok(vars)
}

/// Process variables with a Unicode key and value. Others are skipped.
fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(key, value)| {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!("Skipping non-Unicode environment variable {:?}", key);
                None
            }
        }
    })
}

/// Whether the loaded environment selects local development.
pub fn is_dev_mode(env: &HashMap<String, String>) -> bool {
    env.get(APP_ENV).is_some_and(|v| v == LOCAL)
}

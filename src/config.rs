//! Generator configuration file.
//!
//! ```json
//! { "input": ["schemas/person.json", "https://example.com/tag.json"], "outputFile": "types.d.ts" }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::loader::is_url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Schema sources: file paths or URLs.
    #[serde(default)]
    pub input: Vec<String>,
    /// Where to write declarations; stdout when absent.
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Add command-line sources after the configured ones and let an
    /// explicit output path win.
    pub fn merge_cli(mut self, sources: Vec<String>, output: Option<PathBuf>) -> Self {
        self.input.extend(sources);
        if output.is_some() {
            self.output_file = output;
        }
        self
    }

    /// Fail when there is nothing to generate from.
    pub fn require_sources(&self) -> Result<(), ConfigError> {
        if self.input.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }
}

/// Load a config file; relative paths inside it are taken relative to the
/// file's own directory.
///
/// # Errors
///
/// Returns `ConfigError::ReadError` when the file cannot be read and
/// `ConfigError::InvalidConfig` for malformed JSON or unknown keys.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: GeneratorConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or(Path::new("."));
    config.input = config
        .input
        .into_iter()
        .map(|source| relative_to(base, source))
        .collect();
    config.output_file = config.output_file.map(|out| {
        if out.is_relative() {
            base.join(out)
        } else {
            out
        }
    });

    debug!("loaded config {}: {} input(s)", path.display(), config.input.len());
    Ok(config)
}

fn relative_to(base: &Path, source: String) -> String {
    if is_url(&source) || source.starts_with("file://") || Path::new(&source).is_absolute() {
        return source;
    }
    base.join(&source).to_string_lossy().into_owned()
}

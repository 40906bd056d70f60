//! `eachline.toml` configuration.
//!
//! File values are defaults; command-line flags override them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::lines::Separator;

/// Looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "eachline.toml";

/// How produced lines are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Raw,
    Numbered,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Escaped separator text (`\n`, `\r\n`, ...). Empty means no separator.
    pub separator: String,
    pub limit: Option<usize>,
    pub chomp: bool,
    pub output: OutputMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: "\\n".into(),
            limit: None,
            chomp: false,
            output: OutputMode::Raw,
        }
    }
}

impl Config {
    /// `explicit` must exist when given; otherwise `./eachline.toml` is used
    /// if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            Self::load_from_path(&local)
        } else {
            tracing::debug!("no {CONFIG_FILE_NAME} found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse a limit given as text (command line). Zero is let through so
    /// the iterator's own guard reports it.
    pub fn parse_limit(text: &str) -> Result<usize, Error> {
        let invalid = |reason: String| Error::InvalidArgument {
            argument: "limit",
            reason,
        };
        let trimmed = text.trim();
        if trimmed.starts_with('-') {
            return Err(invalid(format!("must be greater than zero, got {trimmed}")));
        }
        trimmed
            .parse()
            .map_err(|e| invalid(format!("\"{trimmed}\" is not a byte count: {e}")))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_path(path, e))?;
        let config = Self::parse(&content).map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }

    /// Separator in its parsed form.
    pub fn separator(&self) -> Result<Separator, Error> {
        Separator::parse_escaped(&self.separator)
    }
}

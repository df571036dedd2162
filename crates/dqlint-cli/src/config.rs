//! Configuration file handling

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

use crate::args::OutputFormat;

pub const CONFIG_FILE_NAME: &str = "dqlint.toml";

/// Configuration for dqlint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default schema version (e.g. "v21")
    #[serde(default)]
    pub version: Option<String>,

    /// Directory of <version>.json artifacts replacing the bundled ones
    #[serde(default)]
    pub schema_dir: Option<String>,

    /// Query file patterns to check
    #[serde(default)]
    pub files: Vec<String>,

    /// Output format (human, json, sarif)
    #[serde(default)]
    pub format: Option<String>,

    /// Rules to disable (e.g., ["Q0005", "invalid-field"])
    #[serde(default)]
    pub disable: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load dqlint.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "loading configuration");
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load `path` when given, otherwise discover a config file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::find_and_load()?.unwrap_or_default()),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        version: &Option<String>,
        schema_dir: &Option<PathBuf>,
        files: &[PathBuf],
        format: &Option<OutputFormat>,
        disable: &[String],
    ) -> Self {
        if version.is_some() {
            self.version = version.clone();
        }

        if schema_dir.is_some() {
            self.schema_dir = schema_dir.as_ref().map(|p| p.display().to_string());
        }

        if !files.is_empty() {
            self.files = files.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if !disable.is_empty() {
            self.disable = disable.to_vec();
        }

        self
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        match self.format.as_deref() {
            None => Ok(OutputFormat::Human),
            Some(format) => match format.to_lowercase().as_str() {
                "human" => Ok(OutputFormat::Human),
                "json" => Ok(OutputFormat::Json),
                "sarif" => Ok(OutputFormat::Sarif),
                other => miette::bail!(
                    "Unknown output format '{}'. Supported formats: human, json, sarif.",
                    other
                ),
            },
        }
    }
}

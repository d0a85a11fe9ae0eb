use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub census: SourceConfig,
    pub geo: SourceConfig,
}

/// Where a table lives and how to read it. Also the memoisation key for the
/// dataset store, so two configs that differ in any field load separately.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Worksheet name; the first sheet when absent. Ignored for csv.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Maximum number of data rows to read (header excluded).
    #[serde(default)]
    pub max_rows: Option<usize>,
    /// Drop the first column, which holds a spreadsheet row index.
    #[serde(default)]
    pub index_column: bool,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            max_rows: None,
            index_column: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data.duckdb")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_file_glob")]
    pub file_glob: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_glob: default_file_glob(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("datasets/college_scorecard")
}
fn default_file_glob() -> String {
    "MERGED*_PP.csv".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory served at `/` for the browser UI. Disabled when unset.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_max_query_rows")]
    pub max_query_rows: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_query_rows: default_max_query_rows(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_page_size() -> u64 {
    100
}
fn default_max_page_size() -> u64 {
    1000
}
fn default_max_query_rows() -> usize {
    1000
}

/// Reads and validates a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to the built-in defaults when the
/// file does not exist. A file that exists but fails to parse is still an error.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    let server = &config.server;
    if server.max_page_size == 0 {
        anyhow::bail!("server.max_page_size must be >= 1");
    }
    if server.max_query_rows == 0 {
        anyhow::bail!("server.max_query_rows must be >= 1");
    }
    if server.default_page_size == 0 || server.default_page_size > server.max_page_size {
        anyhow::bail!(
            "server.default_page_size must be in [1, {}]",
            server.max_page_size
        );
    }

    globset::Glob::new(&config.loader.file_glob)
        .with_context(|| format!("Invalid loader.file_glob: '{}'", config.loader.file_glob))?;

    Ok(())
}

//! Application configuration for academiccv.
//!
//! User config lives at `~/.academicdb/config.toml`, the database location at
//! `~/.academicdb/dbconfig.toml`. CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Database configuration file name.
const DB_CONFIG_FILE_NAME: &str = "dbconfig.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".academicdb";

/// File name of the local database used when no dbconfig exists.
const DEFAULT_DB_FILE_NAME: &str = "academicdb.db";

// ---------------------------------------------------------------------------
// Config structs (matching config.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// CV rendering options.
    #[serde(default)]
    pub render: RenderConfig,

    /// External typesetter settings.
    #[serde(default)]
    pub typeset: TypesetConfig,

    /// Scopus author-lookup settings.
    #[serde(default)]
    pub scopus: ScopusConfig,
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// LaTeX preamble prepended to the document.
    #[serde(default = "default_header")]
    pub header: String,

    /// LaTeX trailer appended to the document.
    #[serde(default = "default_footer")]
    pub footer: String,

    /// Output `.tex` path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Render the research funding section (off by default).
    #[serde(default)]
    pub include_funding: bool,

    /// Prefix each publication with its EID in bold.
    #[serde(default)]
    pub debug_eids: bool,

    /// DOIs never rendered in the publication list.
    #[serde(default)]
    pub exclude_dois: Vec<String>,

    /// Author list truncation.
    #[serde(default)]
    pub authors: AuthorListConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            footer: default_footer(),
            output: default_output(),
            include_funding: false,
            debug_eids: false,
            exclude_dois: Vec::new(),
            authors: AuthorListConfig::default(),
        }
    }
}

fn default_header() -> String {
    "templates/latex_header.tex".into()
}
fn default_footer() -> String {
    "templates/latex_footer.tex".into()
}
fn default_output() -> String {
    "cv.tex".into()
}

/// `[render.authors]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorListConfig {
    /// Lists longer than this are truncated.
    #[serde(default = "default_max_authors")]
    pub max_authors: usize,

    /// Names kept before "et al." when truncating.
    #[serde(default = "default_show_authors")]
    pub show_authors: usize,
}

impl Default for AuthorListConfig {
    fn default() -> Self {
        Self {
            max_authors: default_max_authors(),
            show_authors: default_show_authors(),
        }
    }
}

fn default_max_authors() -> usize {
    10
}
fn default_show_authors() -> usize {
    3
}

/// `[typeset]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesetConfig {
    /// Run the typesetter after writing the document.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Typesetter executable.
    #[serde(default = "default_typeset_command")]
    pub command: String,

    /// Arguments placed before the document file name.
    #[serde(default = "default_typeset_args")]
    pub args: Vec<String>,

    /// Line fragment the typesetter prints when it produced output.
    #[serde(default = "default_success_marker")]
    pub success_marker: String,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_typeset_command(),
            args: default_typeset_args(),
            success_marker: default_success_marker(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_typeset_command() -> String {
    "xelatex".into()
}
fn default_typeset_args() -> Vec<String> {
    vec!["-halt-on-error".into()]
}
fn default_success_marker() -> String {
    "Output written on".into()
}

/// `[scopus]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopusConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ScopusConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "SCOPUS_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.elsevier.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Database config (dbconfig.toml)
// ---------------------------------------------------------------------------

/// Contents of `dbconfig.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// `[database]` section.
    pub database: DatabaseSection,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Path of the database file.
    #[serde(default, alias = "CONNECT_STRING")]
    pub connect_string: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.academicdb/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CvError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.academicdb/config.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CvError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CvError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CvError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| CvError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CvError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the database file from `~/.academicdb/dbconfig.toml`.
pub fn resolve_database_path() -> Result<PathBuf> {
    resolve_database_path_in(&config_dir()?)
}

/// Resolve the database file using the dbconfig in `dir`.
///
/// When `dbconfig.toml` exists its `connect_string` must be non-empty.
/// Otherwise the default local database inside `dir` is used.
pub fn resolve_database_path_in(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(DB_CONFIG_FILE_NAME);

    if !path.exists() {
        let fallback = dir.join(DEFAULT_DB_FILE_NAME);
        tracing::debug!(?fallback, "no dbconfig found, using default local database");
        return Ok(fallback);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| CvError::io(&path, e))?;
    let db: DbConfig = toml::from_str(&content)
        .map_err(|e| CvError::config(format!("failed to parse {}: {e}", path.display())))?;

    let connect = db.database.connect_string.trim();
    if connect.is_empty() {
        return Err(CvError::config(format!(
            "connect_string must be specified in {}",
            path.display()
        )));
    }

    Ok(PathBuf::from(connect))
}

/// Read the Scopus API key from the configured env var.
pub fn scopus_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.scopus.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(CvError::config(format!(
            "Scopus API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://dev.elsevier.com/apikey/manage"
        ))),
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default seedbox API endpoint.
pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://www.furk.net/api";

/// Log verbosity; accepts the short tags of older config files as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "trc", alias = "tra")]
    Trace,
    #[serde(alias = "deb", alias = "dbg")]
    Debug,
    #[serde(alias = "inf")]
    Info,
    #[default]
    #[serde(alias = "war", alias = "wrn")]
    Warn,
    #[serde(alias = "err")]
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Three-letter tag used in rolling log lines.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRC",
            LogLevel::Debug => "DEB",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WAR",
            LogLevel::Error => "ERR",
        }
    }

    /// `EnvFilter` directive applying this level to the dlm crates.
    pub fn filter_directive(self) -> String {
        format!("warn,dlm_core={0},dlm_cli={0}", self.as_str())
    }
}

/// Seedbox catalog access (`[catalog]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API base URL.
    pub endpoint: String,
    /// API key; required unless the run reads its catalog from a file.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CATALOG_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

/// Raw filter settings (`[filters]` section). Normalized into a
/// `SelectionPolicy` with `SelectionPolicy::from_filters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include_batch_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_batch_keywords: Vec<String>,
    #[serde(default)]
    pub include_item_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_item_keywords: Vec<String>,
    /// Batches larger than this many bytes are skipped (unset or 0 = no limit).
    #[serde(default)]
    pub max_batch_size: Option<u64>,
    /// Items larger than this many bytes are skipped (unset or 0 = no limit).
    #[serde(default)]
    pub max_item_size: Option<u64>,
}

/// Global configuration loaded from `~/.config/dlm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlmConfig {
    /// Number of files transferred at the same time.
    pub max_concurrent_downloads: usize,
    /// Where files are written. Defaults to `~/Downloads/Furk.net`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Create empty placeholder files instead of transferring (dry run).
    #[serde(default)]
    pub simulate: bool,
    /// Log verbosity when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

impl Default for DlmConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 1,
            download_dir: None,
            simulate: false,
            log_level: None,
            catalog: CatalogConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl DlmConfig {
    /// Concurrency limit, never below one slot.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    /// Configured download directory, or `$HOME/Downloads/Furk.net`, or the
    /// current directory when `HOME` is unset.
    pub fn resolved_download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join("Downloads").join("Furk.net"),
            None => PathBuf::from("."),
        }
    }

    /// API key if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.catalog
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DlmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DlmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<DlmConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: DlmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

/// Serialize a config as TOML with the API key masked.
pub fn to_display_toml(cfg: &DlmConfig) -> Result<String> {
    let mut shown = cfg.clone();
    if shown.api_key().is_some() {
        shown.catalog.api_key = Some("********".to_string());
    }
    Ok(toml::to_string_pretty(&shown)?)
}

/// Create the download directory if needed and check that it is writable.
pub fn prepare_download_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create download directory: {}", dir.display()))?;
    let probe = dir.join(".dlm-write-test");
    fs::write(&probe, b"")
        .with_context(|| format!("download directory is not writable: {}", dir.display()))?;
    fs::remove_file(&probe)
        .with_context(|| format!("remove write probe: {}", probe.display()))?;
    Ok(())
}

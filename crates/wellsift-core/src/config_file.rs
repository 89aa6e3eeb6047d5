use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Config;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub source: Option<SourceConfig>,
    pub ocr: Option<OcrConfig>,
    pub concurrency: Option<ConcurrencyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub pdf_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    pub dpi: Option<u32>,
    pub batch_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub num_workers: Option<usize>,
    pub document_timeout_secs: Option<u64>,
}

/// Platform config directory path: `<config_dir>/wellsift/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wellsift").join("config.toml"))
}

/// Load config by cascading CWD `.wellsift.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".wellsift.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        storage: Some(StorageConfig {
            db_path: overlay
                .storage
                .as_ref()
                .and_then(|s| s.db_path.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.db_path.clone())),
        }),
        source: Some(SourceConfig {
            pdf_dir: overlay
                .source
                .as_ref()
                .and_then(|s| s.pdf_dir.clone())
                .or_else(|| base.source.as_ref().and_then(|s| s.pdf_dir.clone())),
        }),
        ocr: Some(OcrConfig {
            dpi: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.dpi)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.dpi)),
            batch_pages: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.batch_pages)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.batch_pages)),
        }),
        concurrency: Some(ConcurrencyConfig {
            num_workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.num_workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.num_workers)),
            document_timeout_secs: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.document_timeout_secs)
                .or_else(|| {
                    base.concurrency
                        .as_ref()
                        .and_then(|c| c.document_timeout_secs)
                }),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}

impl ConfigFile {
    /// Apply file values on top of a base runtime config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(db_path) = self.storage.as_ref().and_then(|s| s.db_path.as_deref()) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(pdf_dir) = self.source.as_ref().and_then(|s| s.pdf_dir.as_deref()) {
            config.pdf_dir = PathBuf::from(pdf_dir);
        }
        if let Some(dpi) = self.ocr.as_ref().and_then(|o| o.dpi) {
            config.ocr_dpi = dpi;
        }
        if let Some(batch_pages) = self.ocr.as_ref().and_then(|o| o.batch_pages) {
            config.ocr_batch_pages = batch_pages;
        }
        if let Some(num_workers) = self.concurrency.as_ref().and_then(|c| c.num_workers) {
            config.num_workers = num_workers;
        }
        if let Some(timeout) = self
            .concurrency
            .as_ref()
            .and_then(|c| c.document_timeout_secs)
        {
            config.document_timeout_secs = timeout;
        }
        config
    }
}

//! Application Configuration
//!
//! JSON file with every field defaulted, plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use crate::domain::{DomainError, DomainResult, DEFAULT_ORDER_STRIDE};

/// Path of the config file, if not `phrasebank.json` in the working directory
pub const CONFIG_ENV: &str = "PHRASEBANK_CONFIG";
/// Overrides `db_path`
pub const DB_ENV: &str = "PHRASEBANK_DB";
const DEFAULT_CONFIG_FILE: &str = "phrasebank.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file, or ":memory:"
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Gap between sort keys after a reorder
    pub order_stride: i64,
    /// Materials fetched per page
    pub page_size: u32,
    /// Quiet period before free-text input is applied
    pub search_debounce_ms: u64,
    /// Also query the single-category fields of rows without paths
    pub legacy_compat: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("phrasebank.db"),
            log_dir: PathBuf::from("logs"),
            order_stride: DEFAULT_ORDER_STRIDE,
            page_size: 30,
            search_debounce_ms: 300,
            legacy_compat: true,
        }
    }
}

impl AppConfig {
    /// Defaults with an in-memory database
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            ..Self::default()
        }
    }

    /// Resolve from `PHRASEBANK_CONFIG` (or `phrasebank.json` if present),
    /// then apply `PHRASEBANK_DB`.
    pub fn load() -> DomainResult<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(db) = std::env::var_os(DB_ENV) {
            config.db_path = PathBuf::from(db);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidInput(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> DomainResult<Self> {
        let config: AppConfig = serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidInput(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.order_stride <= 0 {
            return Err(DomainError::InvalidInput("order_stride must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(DomainError::InvalidInput("page_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AppConfig::from_json(r#"{ "page_size": 10, "legacy_compat": false }"#).unwrap();
        assert_eq!(config.page_size, 10);
        assert!(!config.legacy_compat);
        assert_eq!(config.order_stride, 100);
        assert_eq!(config.search_debounce_ms, 300);
    }

    #[test]
    fn test_rejects_zero_stride() {
        assert!(AppConfig::from_json(r#"{ "order_stride": 0 }"#).is_err());
        assert!(AppConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrasebank.json");
        std::fs::write(&path, r#"{ "db_path": "/tmp/x.db", "order_stride": 10 }"#).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.order_stride, 10);
    }
}

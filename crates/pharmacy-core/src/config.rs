//! Runtime configuration loaded from the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Stock level under which a medication is reported as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PharmacyConfig {
    /// SQLite file; `None` means an in-memory database.
    pub database_path: Option<PathBuf>,
    pub low_stock_threshold: u32,
}

impl Default for PharmacyConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl PharmacyConfig {
    /// Read `PHARMACY_DB_PATH` and `PHARMACY_LOW_STOCK_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("PHARMACY_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let low_stock_threshold = match lookup("PHARMACY_LOW_STOCK_THRESHOLD") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PHARMACY_LOW_STOCK_THRESHOLD must be a number, got {raw:?}"))?,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        Ok(Self {
            database_path,
            low_stock_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PharmacyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PharmacyConfig::default());
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_reads_values() {
        let config = PharmacyConfig::from_lookup(lookup(&[
            ("PHARMACY_DB_PATH", "/var/lib/pharmacy.db"),
            ("PHARMACY_LOW_STOCK_THRESHOLD", " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/pharmacy.db")));
        assert_eq!(config.low_stock_threshold, 25);
    }

    #[test]
    fn test_bad_threshold() {
        let err = PharmacyConfig::from_lookup(lookup(&[("PHARMACY_LOW_STOCK_THRESHOLD", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("PHARMACY_LOW_STOCK_THRESHOLD"));
    }
}

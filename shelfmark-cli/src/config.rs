//! Configuration file loading for shelfmark.
//!
//! Discovers and loads `shelfmark.toml` from the data directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use shelfmark_core::settings::{DEFAULT_BOOKS_FILE, DEFAULT_LOANS_FILE, LibrarySettings};
use shelfmark_domain::LendingPolicy;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "shelfmark.toml";

/// Top-level configuration from shelfmark.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShelfmarkConfig {
    /// Where the record files live.
    pub storage: StorageConfig,

    /// Loan period and late fine.
    pub lending: LendingPolicy,
}

/// Storage section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Book records file, relative to the data directory unless absolute.
    pub books_file: Utf8PathBuf,

    /// Borrow records file, relative to the data directory unless absolute.
    pub loans_file: Utf8PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            books_file: Utf8PathBuf::from(DEFAULT_BOOKS_FILE),
            loans_file: Utf8PathBuf::from(DEFAULT_LOANS_FILE),
        }
    }
}

/// Discover the shelfmark.toml config file in `data_dir`.
pub fn discover_config(data_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a shelfmark.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ShelfmarkConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<ShelfmarkConfig> {
    let config: ShelfmarkConfig = toml::from_str(contents).context("invalid TOML")?;
    config.lending.validate().context("[lending] section")?;
    Ok(config)
}

/// Load config from the data directory, or return default if not found.
pub fn load_or_default(data_dir: &Utf8Path) -> anyhow::Result<ShelfmarkConfig> {
    match discover_config(data_dir) {
        Some(path) => load_config(&path),
        None => Ok(ShelfmarkConfig::default()),
    }
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ShelfmarkConfig,
}

impl ConfigMerger {
    pub fn new(config: ShelfmarkConfig) -> Self {
        Self { config }
    }

    /// CLI lending overrides replace the config file values when given.
    ///
    /// The merged policy is validated, so an out-of-range `--loan-days` is refused here.
    pub fn merge(
        self,
        data_dir: &Utf8Path,
        cli_loan_days: Option<u32>,
        cli_fine_per_day: Option<u64>,
    ) -> anyhow::Result<LibrarySettings> {
        let policy = LendingPolicy {
            loan_days: cli_loan_days.unwrap_or(self.config.lending.loan_days),
            fine_per_day: cli_fine_per_day.unwrap_or(self.config.lending.fine_per_day),
        };
        policy.validate().context("lending policy")?;

        Ok(LibrarySettings {
            data_dir: data_dir.to_path_buf(),
            books_file: self.config.storage.books_file,
            loans_file: self.config.storage.loans_file,
            policy,
        })
    }
}

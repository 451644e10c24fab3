//! Core runtime configuration.
//!
//! Resolved once at startup and passed into the core. Nothing here reads the
//! process environment; the host hands in raw values and this module parses
//! them.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db::{Database, DbResult};
use crate::models::CategoryFilter;

pub const APP_NAME: &str = "MediTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version written into, and required of, backup envelopes.
pub const BACKUP_VERSION: u32 = 1;

/// Filter used when the host supplies none.
pub const DEFAULT_LOG_FILTER: &str = "meditrack_core=info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Unknown category filter: {0}")]
    UnknownCategoryFilter(String),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    database_path: Option<PathBuf>,
    log_filter: String,
    default_category_filter: CategoryFilter,
}

impl Default for CoreConfig {
    /// In-memory database, default log filter, no category filter.
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            default_category_filter: CategoryFilter::All,
        }
    }
}

impl CoreConfig {
    pub fn new(
        database_path: Option<PathBuf>,
        log_filter: impl Into<String>,
        default_category_filter: CategoryFilter,
    ) -> Result<Self, ConfigError> {
        if database_path
            .as_deref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyDatabasePath);
        }

        let log_filter = log_filter.into();
        Ok(Self {
            database_path,
            log_filter: if log_filter.trim().is_empty() {
                DEFAULT_LOG_FILTER.to_string()
            } else {
                log_filter
            },
            default_category_filter,
        })
    }

    /// Build from raw host values such as `MEDITRACK_DB` and `MEDITRACK_LOG`.
    ///
    /// Blank values fall back to the defaults (in-memory database, default
    /// log filter).
    pub fn from_env_values(
        database_path: Option<&str>,
        log_filter: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let database_path = database_path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::new(
            database_path,
            log_filter.unwrap_or(DEFAULT_LOG_FILTER),
            CategoryFilter::All,
        )
    }

    /// Replace the starting filter of new history controllers.
    pub fn with_default_category_filter(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.default_category_filter = CategoryFilter::parse(raw)
            .ok_or_else(|| ConfigError::UnknownCategoryFilter(raw.to_string()))?;
        Ok(self)
    }

    /// `None` means in-memory.
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn default_category_filter(&self) -> CategoryFilter {
        self.default_category_filter
    }

    /// Open the configured database.
    pub fn open_database(&self) -> DbResult<Database> {
        match &self.database_path {
            Some(path) => Database::open(path),
            None => Database::open_in_memory(),
        }
    }
}

//! Runtime configuration for the data-access layer.

use crate::common::{DEFAULT_CORRUPT_ALERT_THRESHOLD, DEFAULT_DB_PATH, DEFAULT_FIXTURES_DIR};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const USE_DOCUMENT_STORE_VAR: &str = "USE_DOCUMENT_STORE";
pub const DB_PATH_VAR: &str = "DB_PATH";
pub const MOCK_DATA_DIR_VAR: &str = "MOCK_DATA_DIR";
pub const CORRUPT_ALERT_THRESHOLD_VAR: &str = "CORRUPT_ALERT_THRESHOLD";

/// Settings shared by both backends.
///
/// `use_document_store` is only the initial mode; the live mode belongs to
/// [DataContext](crate::DataContext) and can be toggled at runtime.
///
/// # Examples
///
/// ```rust
/// use storefront::config::DataConfig;
///
/// let config = DataConfig::builder()
///     .db_path("/tmp/shop/db")
///     .fixtures_dir("/tmp/shop/mock-data")
///     .use_document_store(false)
///     .build();
/// assert!(!config.use_document_store());
/// ```
#[derive(Clone, Debug)]
pub struct DataConfig {
    inner: Arc<DataConfigInner>,
}

#[derive(Debug)]
struct DataConfigInner {
    use_document_store: bool,
    db_path: PathBuf,
    fixtures_dir: PathBuf,
    corrupt_threshold: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::builder().build()
    }
}

impl DataConfig {
    pub fn builder() -> DataConfigBuilder {
        DataConfigBuilder::default()
    }

    /// Loads `.env.local` then `.env` from the working directory (missing
    /// files are ignored, variables already set win) and reads the settings
    /// from the process environment.
    pub fn from_env() -> Self {
        if let Err(err) = dotenvy::from_filename(".env.local") {
            if !err.not_found() {
                log::warn!("Could not load .env.local: {}", err);
            }
        }
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                log::warn!("Could not load .env: {}", err);
            }
        }
        DataConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut builder = DataConfig::builder();
        if let Some(value) = lookup(USE_DOCUMENT_STORE_VAR) {
            builder = builder.use_document_store(parse_flag(&value));
        }
        if let Some(value) = lookup(DB_PATH_VAR).filter(|v| !v.trim().is_empty()) {
            builder = builder.db_path(value.trim());
        }
        if let Some(value) = lookup(MOCK_DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            builder = builder.fixtures_dir(value.trim());
        }
        if let Some(value) = lookup(CORRUPT_ALERT_THRESHOLD_VAR) {
            match value.trim().parse::<f64>() {
                Ok(threshold) if (0.0..=1.0).contains(&threshold) => {
                    builder = builder.corrupt_threshold(threshold)
                }
                _ => log::warn!(
                    "Ignoring {}={}, expected a fraction between 0 and 1",
                    CORRUPT_ALERT_THRESHOLD_VAR,
                    value
                ),
            }
        }
        builder.build()
    }

    pub fn use_document_store(&self) -> bool {
        self.inner.use_document_store
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    pub fn fixtures_dir(&self) -> &Path {
        &self.inner.fixtures_dir
    }

    /// Fraction of unreadable lines a collection file may contain before
    /// loading it fails.
    pub fn corrupt_threshold(&self) -> f64 {
        self.inner.corrupt_threshold
    }
}

/// Anything but a case-insensitive `"false"` enables the document store.
fn parse_flag(value: &str) -> bool {
    !value.trim().eq_ignore_ascii_case("false")
}

/// Builder for [DataConfig].
#[derive(Debug, Clone)]
pub struct DataConfigBuilder {
    use_document_store: bool,
    db_path: PathBuf,
    fixtures_dir: PathBuf,
    corrupt_threshold: f64,
}

impl Default for DataConfigBuilder {
    fn default() -> Self {
        DataConfigBuilder {
            use_document_store: true,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            corrupt_threshold: DEFAULT_CORRUPT_ALERT_THRESHOLD,
        }
    }
}

impl DataConfigBuilder {
    pub fn use_document_store(mut self, enabled: bool) -> Self {
        self.use_document_store = enabled;
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn fixtures_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = path.into();
        self
    }

    pub fn corrupt_threshold(mut self, threshold: f64) -> Self {
        self.corrupt_threshold = threshold;
        self
    }

    pub fn build(self) -> DataConfig {
        DataConfig {
            inner: Arc::new(DataConfigInner {
                use_document_store: self.use_document_store,
                db_path: self.db_path,
                fixtures_dir: self.fixtures_dir,
                corrupt_threshold: self.corrupt_threshold,
            }),
        }
    }
}

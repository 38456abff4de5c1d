//! Database struct and open/close logic
//!
//! This module provides the main Database struct that owns:
//! - The store backend selected by configuration
//! - The retry policy and game constants
//! - Driver metrics
//! - The accepting/shut-down flag
//!
//! ## Mutation API
//!
//! All writes go through the [`RetryDriver`] returned by
//! [`Database::driver`], usually via the facades:
//!
//! ```text
//! let db = Database::ephemeral();
//! let characters = db.characters();
//! characters.acquire_skill("guild", "user", "pack:alice", "heal")?;
//! ```
//!
//! The store itself is never handed out, so nothing writes around the
//! driver. Reads ([`Database::get`], [`Database::scan`]) decode straight from
//! the store.

pub mod config;
mod transactions;

pub use config::{Backend, FableConfig, GameConfig, CONFIG_FILE_NAME};
pub use transactions::RetryConfig;

use crate::ops::{Characters, Guilds, Inventories, Users};
use crate::transaction::{DriverMetrics, RetryDriver, TransactionMetrics};
use fable_core::{codec, Entity, Error, Key, KeyPrefix, Result};
use fable_storage::{DocumentStore, KvStore, Store, VersionedRecord};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Main database struct
///
/// Shared as `Arc<Database>` between threads and facades. Every facade is a
/// stateless view over the same database.
pub struct Database {
    /// Store backend
    store: Arc<dyn Store>,
    /// Loaded configuration
    config: FableConfig,
    /// Cleared by `shutdown`
    accepting: AtomicBool,
    /// Driver counters
    metrics: DriverMetrics,
}

impl Database {
    /// Open a database configured by `fable.toml` in `dir`
    ///
    /// The directory is created if missing, and a default `fable.toml` is
    /// written if none exists.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Arc<Self>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        FableConfig::write_default_if_missing(&config_path)?;
        let config = FableConfig::from_file(&config_path)?;

        Self::open_with_config(config)
    }

    /// Open a database with an explicit configuration
    pub fn open_with_config(config: FableConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let store: Arc<dyn Store> = match config.backend {
            Backend::Kv => Arc::new(KvStore::new()),
            Backend::Document => Arc::new(DocumentStore::new()),
        };
        Ok(Self::with_store(store, config))
    }

    /// Default configuration on the KV backend
    pub fn ephemeral() -> Arc<Self> {
        Self::with_store(Arc::new(KvStore::new()), FableConfig::default())
    }

    /// Wrap an existing store
    ///
    /// Use this to run the engine on a custom [`Store`] implementation.
    pub fn with_store(store: Arc<dyn Store>, config: FableConfig) -> Arc<Self> {
        info!(
            target: "fable::db",
            backend = store.name(),
            max_attempts = config.retry.attempts(),
            "Database opened"
        );
        Arc::new(Self {
            store,
            config,
            accepting: AtomicBool::new(true),
            metrics: DriverMetrics::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Loaded configuration
    pub fn config(&self) -> &FableConfig {
        &self.config
    }

    /// Name of the store backend
    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Snapshot of driver metrics
    pub fn metrics(&self) -> TransactionMetrics {
        self.metrics.snapshot()
    }

    /// Check if the database is accepting operations
    pub fn is_open(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    fn check_accepting(&self) -> Result<()> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Decode the entity stored at `key`
    pub fn get<E: Entity>(&self, key: &Key) -> Result<Option<E>> {
        self.check_accepting()?;
        self.store
            .get(key)?
            .map(|record| codec::decode(&record.value))
            .transpose()
    }

    /// Decode every entity under `prefix`, in key order
    pub fn scan<E: Entity>(&self, prefix: &KeyPrefix) -> Result<Vec<E>> {
        self.check_accepting()?;
        self.store
            .scan_prefix(prefix)?
            .iter()
            .map(|(_, record)| codec::decode(&record.value))
            .collect()
    }

    /// Stored bytes and version at `key`, undecoded
    pub fn get_raw(&self, key: &Key) -> Result<Option<VersionedRecord>> {
        self.check_accepting()?;
        self.store.get(key)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Retry driver bound to this database
    ///
    /// # Errors
    ///
    /// `Error::Closed` after [`Database::shutdown`].
    pub fn driver(&self) -> Result<RetryDriver<'_>> {
        self.check_accepting()?;
        Ok(RetryDriver::new(
            self.store.as_ref(),
            &self.config.retry,
            &self.metrics,
        ))
    }

    // ========================================================================
    // Facades
    // ========================================================================

    /// Character operations
    pub fn characters(self: &Arc<Self>) -> Characters {
        Characters::new(Arc::clone(self))
    }

    /// Inventory operations
    pub fn inventories(self: &Arc<Self>) -> Inventories {
        Inventories::new(Arc::clone(self))
    }

    /// Guild operations
    pub fn guilds(self: &Arc<Self>) -> Guilds {
        Guilds::new(Arc::clone(self))
    }

    /// User operations
    pub fn users(self: &Arc<Self>) -> Users {
        Users::new(Arc::clone(self))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stop accepting operations and close the store
    ///
    /// Mutations already inside the driver finish their current attempt;
    /// their commit fails with `Error::Closed` if it comes after the store
    /// closed. Calling it twice is harmless.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            self.store.close();
            let metrics = self.metrics.snapshot();
            info!(
                target: "fable::db",
                committed = metrics.committed,
                conflicts = metrics.conflicts,
                exhausted = metrics.exhausted,
                "Database shut down"
            );
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::model::Guild;
    use fable_core::EntityKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_writes_default_config() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(db.config(), &FableConfig::default());
        assert_eq!(db.backend_name(), "kv");
    }

    #[test]
    fn test_open_reads_backend() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "backend = \"document\"\n").unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.backend_name(), "document");
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "backend = 3\n").unwrap();
        assert!(matches!(Database::open(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_shutdown_rejects_everything() {
        let db = Database::ephemeral();
        assert!(db.is_open());
        db.shutdown();
        db.shutdown();
        assert!(!db.is_open());

        let key = Key::primary(EntityKind::Guild, "global", "g1");
        assert!(matches!(db.get::<Guild>(&key), Err(Error::Closed)));
        assert!(matches!(db.driver(), Err(Error::Closed)));
    }

    #[test]
    fn test_get_missing_is_none() {
        let db = Database::ephemeral();
        let key = Key::primary(EntityKind::Guild, "global", "g1");
        assert!(db.get::<Guild>(&key).unwrap().is_none());
    }
}

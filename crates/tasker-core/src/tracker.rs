use tracing::info;

use crate::analytics::Analytics;
use crate::config::TrackerConfig;
use crate::db::Database;
use crate::error::StoreError;
use crate::query::QueryEngine;
use crate::store::{ProjectStore, TagStore, TaskStore};

/// One database handle wired into every store and read path.
#[derive(Debug, Clone)]
pub struct Tracker {
    db: Database,
    projects: ProjectStore,
    tasks: TaskStore,
    tags: TagStore,
    query: QueryEngine,
    analytics: Analytics,
}

impl Tracker {
    /// Build every component over one shared handle without opening it.
    #[must_use]
    pub fn new(config: &TrackerConfig) -> Self {
        let db = Database::new(config.database.clone());
        Self {
            projects: ProjectStore::new(db.clone()),
            tasks: TaskStore::new(db.clone()),
            tags: TagStore::new(db.clone()),
            query: QueryEngine::new(db.clone(), config.query.default_limit),
            analytics: Analytics::new(db.clone()),
            db,
        }
    }

    /// Build the tracker and open its database eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema
    /// cannot be applied.
    pub fn open(config: &TrackerConfig) -> Result<Self, StoreError> {
        let tracker = Self::new(config);
        tracker.db.initialize()?;
        info!(path = %tracker.db.path().display(), "tracker ready");
        Ok(tracker)
    }

    /// An in-memory tracker with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut config = TrackerConfig::default();
        config.database = crate::config::DatabaseConfig::in_memory();
        Self::open(&config)
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub const fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    #[must_use]
    pub const fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    #[must_use]
    pub const fn tags(&self) -> &TagStore {
        &self.tags
    }

    #[must_use]
    pub const fn query(&self) -> &QueryEngine {
        &self.query
    }

    #[must_use]
    pub const fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    /// Release the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` fails to close cleanly.
    pub fn close(&self) -> Result<(), StoreError> {
        self.db.close()
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::config::Settings;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: SqlitePool,
    import_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: SqlitePool) -> Self {
        Self {
            inner: Arc::new(InnerState { settings, db, import_locks: Mutex::new(HashMap::new()) }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Serializes imports into the same document. Locks nobody waits on are
    /// dropped from the table on the next call.
    pub(crate) async fn lock_document_import(&self, document_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.import_locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(document_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

//! Per-session store ownership.
//!
//! Each conversation owns exactly one [`Store`]. The store sits behind a
//! `tokio::sync::Mutex` so that ingestion and queries arriving concurrently
//! for the same session run one at a time; different sessions never share a
//! lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::store::Store;

/// A store handle shared by all requests of one session.
pub type SharedStore = Arc<Mutex<Store>>;

/// Create an unpopulated store handle.
pub fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(Store::new()))
}

/// Registry of session stores, created lazily on first use.
#[derive(Debug, Default)]
pub struct SessionStores {
    sessions: RwLock<HashMap<String, SharedStore>>,
}

impl SessionStores {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the store for `session_id`, creating it if needed.
    pub async fn get_or_create(&self, session_id: &str) -> SharedStore {
        if let Some(store) = self.sessions.read().await.get(session_id) {
            return Arc::clone(store);
        }

        let mut sessions = self.sessions.write().await;
        let store = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "creating session store");
            shared_store()
        });
        Arc::clone(store)
    }

    /// Return the store for `session_id` if one exists.
    pub async fn get(&self, session_id: &str) -> Option<SharedStore> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Drop a session's store. Returns `true` if it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session has a store.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

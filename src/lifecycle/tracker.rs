//! Most-recent timed event, persisted across restarts.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::relay::store::KvStore;

/// Shared handle to the lifecycle state. Clones see the same title.
#[derive(Clone)]
pub struct LifecycleTracker {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn KvStore>,
    key: String,
    title: RwLock<Option<String>>,
}

impl LifecycleTracker {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                key: key.into(),
                title: RwLock::new(None),
            }),
        }
    }

    /// Load the persisted title. Missing keys and store failures both leave
    /// the tracker empty.
    pub async fn init(&self) {
        let loaded = match self.inner.store.get(&self.inner.key).await {
            Ok(value) => value.filter(|title| !title.is_empty()),
            Err(e) => {
                warn!(key = %self.inner.key, "Failed to load most recent event: {}", e);
                None
            }
        };
        info!(title = ?loaded, "Most recent event loaded");
        self.replace(loaded);
    }

    /// Record `title` as the most recent event and persist it.
    ///
    /// Repeating the current title is a no-op.
    pub async fn set(&self, title: &str) {
        if self.get().as_deref() == Some(title) {
            return;
        }
        self.replace(Some(title.to_string()));
        debug!(title = %title, "Most recent event updated");
        if let Err(e) = self.inner.store.set(&self.inner.key, title).await {
            warn!(key = %self.inner.key, title = %title, "Failed to persist most recent event: {}", e);
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.inner.title.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, title: Option<String>) {
        match self.inner.title.write() {
            Ok(mut guard) => *guard = title,
            Err(poisoned) => *poisoned.into_inner() = title,
        }
    }
}

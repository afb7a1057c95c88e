//! In-memory stores for tasks and lists.
//!
//! Each store owns its collection and one JSON document. Mutators update
//! memory first, then persist the whole collection, then notify subscribers.
//! A failed write is logged and reported through [`SaveStatus`] but never
//! rolls back the in-memory change.

pub mod list_store;
pub mod todo_store;

pub use list_store::{ListStore, ListUpdate};
pub use todo_store::{TodoCounts, TodoStore};

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Serialize, de::DeserializeOwned};

use crate::storage::Storage;

/// Outcome of a store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// State changed and the document was written.
    Saved,
    /// View state changed; nothing to persist. Subscribers were notified.
    ViewOnly,
    /// Nothing happened: blank text, unknown id, protected list, or no effective change.
    Unchanged,
    /// `init` read the existing document. Subscribers were notified.
    Loaded,
    /// Memory no longer matches the document: a write failed, or `init` could
    /// not read it. Subscribers were notified.
    Failed(String),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Whether in-memory state was touched.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Change subscribers of one store.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Call every subscriber once. The registry is not locked while listeners
    /// run, so a listener may unsubscribe itself.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = lock(&self.inner)
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `on_change`; pass it back via [`Subscription::unsubscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

pub(crate) enum Loaded<T> {
    Found(Vec<T>),
    Missing,
    Failed(String),
}

pub(crate) async fn load<T: DeserializeOwned>(storage: &Storage, document: &str) -> Loaded<T> {
    match storage.read_json::<Vec<T>>(document).await {
        Ok(items) => Loaded::Found(items),
        Err(e) if e.is_not_found() => Loaded::Missing,
        Err(e) => {
            log::error!("Failed to read {}: {}", document, e);
            Loaded::Failed(e.to_string())
        }
    }
}

/// Write the whole collection, then notify regardless of the write result.
pub(crate) async fn persist<T: Serialize>(
    storage: &Storage,
    document: &str,
    items: &[T],
    listeners: &Listeners,
) -> SaveStatus {
    let status = match storage.write_json(document, items).await {
        Ok(()) => SaveStatus::Saved,
        Err(e) => {
            log::error!("Failed to save {}: {}", document, e);
            SaveStatus::Failed(e.to_string())
        }
    };
    listeners.notify();
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notify_reaches_every_subscriber() {
        let listeners = Listeners::default();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            let _ = listeners.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        listeners.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let listeners = Listeners::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let first = {
            let hits = Arc::clone(&hits);
            listeners.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _second = {
            let hits = Arc::clone(&hits);
            listeners.subscribe(move || {
                hits.fetch_add(10, Ordering::SeqCst);
            })
        };

        first.unsubscribe();
        assert_eq!(listeners.len(), 1);
        listeners.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn unsubscribe_after_registry_dropped_is_harmless() {
        let listeners = Listeners::default();
        let sub = listeners.subscribe(|| {});
        drop(listeners);
        sub.unsubscribe();
    }

    #[test]
    fn status_helpers() {
        assert!(SaveStatus::Saved.is_saved());
        assert!(SaveStatus::Failed("disk full".into()).changed());
        assert!(SaveStatus::ViewOnly.changed());
        assert!(SaveStatus::Loaded.changed());
        assert!(!SaveStatus::Unchanged.changed());
    }
}

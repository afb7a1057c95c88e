use super::{Listeners, Loaded, SaveStatus, Subscription, load, persist};
use crate::core::list::{DEFAULT_LIST_ID, TodoList, default_lists};
use crate::storage::{LISTS_DOCUMENT, Storage};

/// Fields to change on a list. `None` leaves a field as it is; id and creation
/// time can never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` clears the icon.
    pub icon: Option<Option<String>>,
    pub shared: Option<bool>,
    pub sort_order: Option<u32>,
}

impl ListUpdate {
    fn apply(self, list: &mut TodoList) -> bool {
        let before = list.clone();
        if let Some(name) = self.name {
            list.name = name;
        }
        if let Some(color) = self.color {
            list.color = color;
        }
        if let Some(icon) = self.icon {
            list.icon = icon;
        }
        if let Some(shared) = self.shared {
            list.shared = shared;
        }
        if let Some(sort_order) = self.sort_order {
            list.sort_order = sort_order;
        }
        *list != before
    }
}

/// Owns the list collection and the current list selection.
pub struct ListStore {
    storage: Storage,
    lists: Vec<TodoList>,
    selected_list_id: String,
    listeners: Listeners,
}

impl ListStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            lists: Vec::new(),
            selected_list_id: DEFAULT_LIST_ID.to_string(),
            listeners: Listeners::default(),
        }
    }

    /// Load the collection, seeding the four default lists on first run.
    /// Subscribers are notified exactly once.
    ///
    /// The default list always exists afterwards: a document without it gets
    /// it back, and an unreadable document is replaced by the seeds in memory
    /// only, leaving the file alone until the next mutation.
    pub async fn init(&mut self) -> SaveStatus {
        let status = match load::<TodoList>(&self.storage, LISTS_DOCUMENT).await {
            Loaded::Found(lists) => {
                log::info!("Loaded {} lists", lists.len());
                self.lists = lists;
                if self.list_by_id(DEFAULT_LIST_ID).is_none() {
                    log::warn!("{} has no default list, restoring it", LISTS_DOCUMENT);
                    self.lists.extend(default_lists().into_iter().take(1));
                    self.lists.rotate_right(1);
                    return self.save().await;
                }
                SaveStatus::Loaded
            }
            Loaded::Missing => {
                log::info!("No {} yet, seeding default lists", LISTS_DOCUMENT);
                self.lists = default_lists();
                return self.save().await;
            }
            Loaded::Failed(e) => {
                self.lists = default_lists();
                SaveStatus::Failed(e)
            }
        };
        self.listeners.notify();
        status
    }

    pub fn on_change(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    async fn save(&self) -> SaveStatus {
        persist(&self.storage, LISTS_DOCUMENT, &self.lists, &self.listeners).await
    }

    /// All lists by ascending sort order; ties keep insertion order.
    pub fn lists(&self) -> Vec<&TodoList> {
        let mut lists: Vec<&TodoList> = self.lists.iter().collect();
        lists.sort_by_key(|l| l.sort_order);
        lists
    }

    pub fn list_by_id(&self, id: &str) -> Option<&TodoList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn selected_list_id(&self) -> &str {
        &self.selected_list_id
    }

    pub fn selected_list(&self) -> Option<&TodoList> {
        self.list_by_id(&self.selected_list_id)
    }

    /// Select a list. Unknown ids are ignored without notifying.
    pub fn set_selected_list_id(&mut self, id: &str) -> SaveStatus {
        if self.list_by_id(id).is_none() {
            log::debug!("Ignoring selection of unknown list {}", id);
            return SaveStatus::Unchanged;
        }
        self.selected_list_id = id.to_string();
        self.listeners.notify();
        SaveStatus::ViewOnly
    }

    /// Append a new list at the end of the ordering.
    pub async fn add_list(
        &mut self,
        name: &str,
        color: &str,
        icon: Option<String>,
    ) -> (TodoList, SaveStatus) {
        let list = TodoList::new(name, color, icon, self.lists.len() as u32);
        self.lists.push(list.clone());
        let status = self.save().await;
        (list, status)
    }

    pub async fn update_list(&mut self, id: &str, update: ListUpdate) -> SaveStatus {
        let Some(list) = self.lists.iter_mut().find(|l| l.id == id) else {
            log::debug!("Ignoring update for unknown list {}", id);
            return SaveStatus::Unchanged;
        };
        if !update.apply(list) {
            return SaveStatus::Unchanged;
        }
        self.save().await
    }

    /// Remove a list. The default list is protected. Tasks that referenced the
    /// list are left alone; see `TodoStore::reassign_list`.
    pub async fn delete_list(&mut self, id: &str) -> SaveStatus {
        if id == DEFAULT_LIST_ID {
            log::debug!("Refusing to delete the default list");
            return SaveStatus::Unchanged;
        }
        let before = self.lists.len();
        self.lists.retain(|l| l.id != id);
        if self.lists.len() == before {
            return SaveStatus::Unchanged;
        }
        if self.selected_list_id == id {
            self.selected_list_id = DEFAULT_LIST_ID.to_string();
        }
        self.save().await
    }

    /// Rewrite sort orders to follow `ordered_ids`.
    ///
    /// Unknown and repeated ids are ignored. Lists missing from `ordered_ids`
    /// are kept after the named ones, in their previous order. Sort orders end
    /// up as `0..n`.
    pub async fn reorder_lists<S: AsRef<str>>(&mut self, ordered_ids: &[S]) -> SaveStatus {
        let previous: Vec<(String, u32)> = self
            .lists
            .iter()
            .map(|l| (l.id.clone(), l.sort_order))
            .collect();

        let mut remaining = std::mem::take(&mut self.lists);
        remaining.sort_by_key(|l| l.sort_order);

        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered_ids {
            if let Some(pos) = remaining.iter().position(|l| l.id == id.as_ref()) {
                reordered.push(remaining.remove(pos));
            }
        }
        if !remaining.is_empty() {
            log::warn!(
                "Reorder omitted {} lists, keeping them at the end",
                remaining.len()
            );
        }
        reordered.extend(remaining);

        for (list, sort_order) in reordered.iter_mut().zip(0u32..) {
            list.sort_order = sort_order;
        }
        self.lists = reordered;

        let unchanged = self
            .lists
            .iter()
            .map(|l| (l.id.clone(), l.sort_order))
            .eq(previous);
        if unchanged {
            return SaveStatus::Unchanged;
        }
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    async fn seeded_store(tmp: &TempDir) -> ListStore {
        let mut store = ListStore::new(Storage::new(tmp.path()));
        store.init().await;
        store
    }

    async fn three_list_store(tmp: &TempDir) -> ListStore {
        let storage = Storage::new(tmp.path());
        let lists: Vec<TodoList> = default_lists().into_iter().take(3).collect();
        storage.write_json(LISTS_DOCUMENT, &lists).await.unwrap();
        let mut store = ListStore::new(storage);
        store.init().await;
        store
    }

    fn ids(store: &ListStore) -> Vec<String> {
        store.lists().iter().map(|l| l.id.clone()).collect()
    }

    async fn reload(tmp: &TempDir) -> Vec<TodoList> {
        Storage::new(tmp.path())
            .read_json(LISTS_DOCUMENT)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fresh_init_seeds_four_lists() {
        let tmp = TempDir::new().unwrap();
        let mut store = ListStore::new(Storage::new(tmp.path()));
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&hits);
        let _ = store.on_change(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(store.init().await, SaveStatus::Saved);
        assert_eq!(ids(&store), vec!["default", "personal", "work", "shopping"]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(reload(&tmp).await, store.lists);
    }

    #[tokio::test]
    async fn unreadable_document_falls_back_to_seeds_without_overwriting() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        storage.write(LISTS_DOCUMENT, "{oops".into()).await.unwrap();
        let mut store = ListStore::new(storage.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&hits);
        let _ = store.on_change(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });

        assert!(matches!(store.init().await, SaveStatus::Failed(_)));
        assert_eq!(ids(&store), vec!["default", "personal", "work", "shopping"]);
        assert_eq!(store.selected_list().map(|l| l.id.as_str()), Some(DEFAULT_LIST_ID));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(storage.read(LISTS_DOCUMENT).await.unwrap(), "{oops");
    }

    #[tokio::test]
    async fn document_without_default_list_gets_it_back() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        let lists: Vec<TodoList> = default_lists().into_iter().skip(1).collect();
        storage.write_json(LISTS_DOCUMENT, &lists).await.unwrap();
        let mut store = ListStore::new(storage);

        assert_eq!(store.init().await, SaveStatus::Saved);
        assert_eq!(ids(&store), vec!["default", "personal", "work", "shopping"]);
        assert!(store.selected_list().is_some());
        assert_eq!(reload(&tmp).await, store.lists);
    }

    #[tokio::test]
    async fn loading_existing_document_reports_loaded() {
        let tmp = TempDir::new().unwrap();
        seeded_store(&tmp).await;
        let mut store = ListStore::new(Storage::new(tmp.path()));
        assert_eq!(store.init().await, SaveStatus::Loaded);
        assert_eq!(store.lists.len(), 4);
    }

    #[tokio::test]
    async fn default_list_cannot_be_deleted() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;

        assert_eq!(store.delete_list(DEFAULT_LIST_ID).await, SaveStatus::Unchanged);
        assert!(store.list_by_id(DEFAULT_LIST_ID).is_some());

        for id in ["personal", "work", "shopping"] {
            store.delete_list(id).await;
            assert_eq!(store.delete_list(DEFAULT_LIST_ID).await, SaveStatus::Unchanged);
        }
        assert_eq!(ids(&store), vec!["default"]);
    }

    #[tokio::test]
    async fn deleting_selected_list_resets_selection() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;

        assert_eq!(store.set_selected_list_id("work"), SaveStatus::ViewOnly);
        assert_eq!(store.selected_list_id(), "work");
        assert!(store.delete_list("work").await.is_saved());
        assert_eq!(store.selected_list_id(), DEFAULT_LIST_ID);
        assert_eq!(store.selected_list().map(|l| l.name.as_str()), Some("Tasks"));

        let saved = reload(&tmp).await;
        assert_eq!(saved, store.lists);
        assert!(saved.iter().all(|l| l.id != "work"));
    }

    #[tokio::test]
    async fn selecting_unknown_list_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&hits);
        let _ = store.on_change(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(store.set_selected_list_id("missing"), SaveStatus::Unchanged);
        assert_eq!(store.selected_list_id(), DEFAULT_LIST_ID);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn add_list_appends_at_end() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;

        let (list, status) = store
            .add_list("Errands", "#ef4444", Some("🚗".into()))
            .await;
        assert!(status.is_saved());
        assert_eq!(list.sort_order, 4);
        assert_eq!(store.lists().last().map(|l| l.id.clone()), Some(list.id.clone()));
        assert_eq!(reload(&tmp).await, store.lists);
    }

    #[tokio::test]
    async fn update_list_merges_only_given_fields() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;
        let created = store.list_by_id("work").unwrap().created_at;

        let status = store
            .update_list(
                "work",
                ListUpdate {
                    name: Some("Office".into()),
                    icon: Some(None),
                    ..ListUpdate::default()
                },
            )
            .await;
        assert!(status.is_saved());

        let work = store.list_by_id("work").unwrap();
        assert_eq!(work.name, "Office");
        assert_eq!(work.color, "#10b981");
        assert_eq!(work.icon, None);
        assert_eq!(work.created_at, created);
        assert_eq!(reload(&tmp).await, store.lists);

        assert_eq!(
            store.update_list("missing", ListUpdate::default()).await,
            SaveStatus::Unchanged
        );
        assert_eq!(
            store.update_list("work", ListUpdate::default()).await,
            SaveStatus::Unchanged
        );
    }

    #[tokio::test]
    async fn reorder_three_lists() {
        let tmp = TempDir::new().unwrap();
        let mut store = three_list_store(&tmp).await;

        store.reorder_lists(&["work", "default", "personal"]).await;
        let lists = store.lists();
        let got: Vec<(&str, u32)> = lists.iter().map(|l| (l.id.as_str(), l.sort_order)).collect();
        assert_eq!(got, vec![("work", 0), ("default", 1), ("personal", 2)]);
        assert_eq!(reload(&tmp).await, store.lists);
    }

    #[tokio::test]
    async fn reorder_keeps_omitted_lists() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;

        store.reorder_lists(&["shopping", "ghost", "shopping", "work"]).await;
        assert_eq!(ids(&store), vec!["shopping", "work", "default", "personal"]);
        let orders: Vec<u32> = store.lists().iter().map(|l| l.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn reorder_to_same_order_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let mut store = seeded_store(&tmp).await;
        let current = ids(&store);
        assert_eq!(store.reorder_lists(&current).await, SaveStatus::Unchanged);
    }

    #[tokio::test]
    async fn equal_sort_orders_keep_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        let mut lists = default_lists();
        for list in &mut lists {
            list.sort_order = 0;
        }
        storage.write_json(LISTS_DOCUMENT, &lists).await.unwrap();
        let mut store = ListStore::new(storage);
        store.init().await;

        assert_eq!(ids(&store), vec!["default", "personal", "work", "shopping"]);
    }

    #[tokio::test]
    async fn write_failure_keeps_memory_and_still_notifies() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let mut store = ListStore::new(Storage::new(&blocker));
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&hits);
        let _ = store.on_change(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });

        assert!(matches!(store.init().await, SaveStatus::Failed(_)));
        assert_eq!(store.lists.len(), 4);

        let (list, status) = store.add_list("Errands", "#ef4444", None).await;
        assert!(matches!(status, SaveStatus::Failed(_)));
        assert!(store.list_by_id(&list.id).is_some());

        let status = store.delete_list("work").await;
        assert!(matches!(status, SaveStatus::Failed(_)));
        assert!(status.changed());
        assert!(store.list_by_id("work").is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}

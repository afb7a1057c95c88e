use chrono::{DateTime, Utc};

use super::{Listeners, Loaded, SaveStatus, Subscription, load, persist};
use crate::core::recurrence::RecurrencePattern;
use crate::core::task::{Attachment, NewAttachment, Priority, SourceType, Step, Todo};
use crate::core::view::{self, FilterType, FocusMove, SortOption};
use crate::core::DEFAULT_LIST_ID;
use crate::import::ImportItem;
use crate::storage::{Storage, TODOS_DOCUMENT};

/// Example tasks written on first run: (id, text, completed).
const SEED_TODOS: [(&str, &str, bool); 3] = [
    ("1", "Explore taskdesk", true),
    ("2", "Organize tasks into lists", false),
    ("3", "Import tasks from notes or screenshots", false),
];

fn seed_todos() -> Vec<Todo> {
    SEED_TODOS
        .iter()
        .map(|(id, text, completed)| {
            let mut todo = Todo::new(*text);
            todo.id = id.to_string();
            todo.completed = *completed;
            todo
        })
        .collect()
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn normalize(text: Option<String>) -> Option<String> {
    text.and_then(|t| non_blank(&t).map(str::to_string))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoCounts {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
}

/// Owns the task collection and the view state derived from it.
pub struct TodoStore {
    storage: Storage,
    todos: Vec<Todo>,
    filter: FilterType,
    search_term: String,
    focused_todo_id: Option<String>,
    listeners: Listeners,
}

impl TodoStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            todos: Vec::new(),
            filter: FilterType::All,
            search_term: String::new(),
            focused_todo_id: None,
            listeners: Listeners::default(),
        }
    }

    /// Load the collection, seeding examples on first run. Subscribers are
    /// notified exactly once.
    ///
    /// An unreadable document leaves the store empty and is not overwritten
    /// until the next mutation.
    pub async fn init(&mut self) -> SaveStatus {
        let status = match load::<Todo>(&self.storage, TODOS_DOCUMENT).await {
            Loaded::Found(todos) => {
                log::info!("Loaded {} tasks", todos.len());
                self.todos = todos;
                SaveStatus::Loaded
            }
            Loaded::Missing => {
                log::info!("No {} yet, seeding example tasks", TODOS_DOCUMENT);
                self.todos = seed_todos();
                return self.save().await;
            }
            Loaded::Failed(e) => {
                self.todos = Vec::new();
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
        persist(&self.storage, TODOS_DOCUMENT, &self.todos, &self.listeners).await
    }

    /// Apply `change` to one task; it returns whether anything actually changed.
    async fn update(&mut self, id: &str, change: impl FnOnce(&mut Todo) -> bool) -> SaveStatus {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            log::debug!("Ignoring update for unknown task {}", id);
            return SaveStatus::Unchanged;
        };
        if !change(todo) {
            return SaveStatus::Unchanged;
        }
        self.save().await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn add_todo(&mut self, text: &str) -> SaveStatus {
        let Some(text) = non_blank(text) else {
            log::debug!("Ignoring blank task");
            return SaveStatus::Unchanged;
        };
        self.todos.push(Todo::new(text));
        self.save().await
    }

    /// Batch add for imports. Blank items are skipped; one write and one
    /// notification cover the whole batch.
    pub async fn add_todos(&mut self, items: Vec<ImportItem>, source_type: SourceType) -> SaveStatus {
        let before = self.todos.len();
        for item in items {
            let Some(text) = non_blank(&item.text) else {
                continue;
            };
            let mut todo = Todo::new(text);
            todo.description = normalize(item.description);
            todo.source_type = Some(source_type);
            todo.source_data = item.source_data;
            self.todos.push(todo);
        }

        let added = self.todos.len() - before;
        if added == 0 {
            log::debug!("Import produced no tasks");
            return SaveStatus::Unchanged;
        }
        log::info!("Imported {} tasks from {}", added, source_type.label());
        self.save().await
    }

    /// Flip completion. Completing a recurring task with a due date appends its
    /// next occurrence in the same write.
    pub async fn toggle_todo_completion(&mut self, id: &str) -> SaveStatus {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            log::debug!("Ignoring toggle for unknown task {}", id);
            return SaveStatus::Unchanged;
        };
        todo.completed = !todo.completed;
        let follow_up = if todo.completed {
            todo.next_occurrence()
        } else {
            None
        };
        if let Some(next) = follow_up {
            log::debug!("Scheduling next occurrence of {}", id);
            self.todos.push(next);
        }
        self.save().await
    }

    pub async fn update_todo_text(&mut self, id: &str, new_text: &str) -> SaveStatus {
        let Some(new_text) = non_blank(new_text) else {
            return SaveStatus::Unchanged;
        };
        self.update(id, |todo| {
            if todo.text == new_text {
                return false;
            }
            todo.text = new_text.to_string();
            true
        })
        .await
    }

    pub async fn delete_todo(&mut self, id: &str) -> SaveStatus {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.len() == before {
            log::debug!("Ignoring delete for unknown task {}", id);
            return SaveStatus::Unchanged;
        }
        if self.focused_todo_id.as_deref() == Some(id) {
            self.focused_todo_id = None;
        }
        self.save().await
    }

    pub async fn toggle_my_day(&mut self, id: &str) -> SaveStatus {
        self.update(id, |todo| {
            todo.my_day = !todo.my_day;
            true
        })
        .await
    }

    pub async fn set_priority(&mut self, id: &str, priority: Priority) -> SaveStatus {
        self.update(id, |todo| {
            let changed = todo.priority != priority;
            todo.priority = priority;
            changed
        })
        .await
    }

    pub async fn set_due_date(&mut self, id: &str, due_date: Option<DateTime<Utc>>) -> SaveStatus {
        self.update(id, |todo| {
            let changed = todo.due_date != due_date;
            todo.due_date = due_date;
            changed
        })
        .await
    }

    pub async fn set_reminder(&mut self, id: &str, reminder: Option<DateTime<Utc>>) -> SaveStatus {
        self.update(id, |todo| {
            let changed = todo.reminder != reminder;
            todo.reminder = reminder;
            changed
        })
        .await
    }

    /// Move a task to another list. The caller guarantees `list_id` exists.
    pub async fn move_to_list(&mut self, id: &str, list_id: &str) -> SaveStatus {
        self.update(id, |todo| {
            if todo.list_id == list_id {
                return false;
            }
            todo.list_id = list_id.to_string();
            true
        })
        .await
    }

    /// Move every task of list `from` into list `to`, e.g. after `from` was deleted.
    pub async fn reassign_list(&mut self, from: &str, to: &str) -> SaveStatus {
        if from == to {
            return SaveStatus::Unchanged;
        }
        let mut moved = 0;
        for todo in self.todos.iter_mut().filter(|t| t.list_id == from) {
            todo.list_id = to.to_string();
            moved += 1;
        }
        if moved == 0 {
            return SaveStatus::Unchanged;
        }
        log::info!("Moved {} tasks from list {} to {}", moved, from, to);
        self.save().await
    }

    pub async fn add_tag(&mut self, id: &str, tag: &str) -> SaveStatus {
        let Some(tag) = non_blank(tag) else {
            return SaveStatus::Unchanged;
        };
        self.update(id, |todo| {
            if todo.has_tag(tag) {
                return false;
            }
            todo.tags.push(tag.to_string());
            true
        })
        .await
    }

    pub async fn remove_tag(&mut self, id: &str, tag: &str) -> SaveStatus {
        self.update(id, |todo| {
            let before = todo.tags.len();
            todo.tags.retain(|t| t != tag);
            todo.tags.len() != before
        })
        .await
    }

    pub async fn add_step(&mut self, id: &str, text: &str) -> SaveStatus {
        let Some(text) = non_blank(text) else {
            return SaveStatus::Unchanged;
        };
        self.update(id, |todo| {
            todo.steps.push(Step::new(text));
            true
        })
        .await
    }

    pub async fn toggle_step(&mut self, id: &str, step_id: &str) -> SaveStatus {
        self.update(id, |todo| match todo.steps.iter_mut().find(|s| s.id == step_id) {
            Some(step) => {
                step.completed = !step.completed;
                true
            }
            None => false,
        })
        .await
    }

    pub async fn remove_step(&mut self, id: &str, step_id: &str) -> SaveStatus {
        self.update(id, |todo| {
            let before = todo.steps.len();
            todo.steps.retain(|s| s.id != step_id);
            todo.steps.len() != before
        })
        .await
    }

    pub async fn set_notes(&mut self, id: &str, notes: Option<String>) -> SaveStatus {
        let notes = normalize(notes);
        self.update(id, |todo| {
            let changed = todo.notes != notes;
            todo.notes = notes;
            changed
        })
        .await
    }

    pub async fn set_description(&mut self, id: &str, description: Option<String>) -> SaveStatus {
        let description = normalize(description);
        self.update(id, |todo| {
            let changed = todo.description != description;
            todo.description = description;
            changed
        })
        .await
    }

    pub async fn add_attachment(&mut self, id: &str, attachment: NewAttachment) -> SaveStatus {
        self.update(id, |todo| {
            todo.attachments.push(Attachment::from_new(attachment));
            true
        })
        .await
    }

    pub async fn remove_attachment(&mut self, id: &str, attachment_id: &str) -> SaveStatus {
        self.update(id, |todo| {
            let before = todo.attachments.len();
            todo.attachments.retain(|a| a.id != attachment_id);
            todo.attachments.len() != before
        })
        .await
    }

    pub async fn set_recurrence(
        &mut self,
        id: &str,
        recurrence: Option<RecurrencePattern>,
    ) -> SaveStatus {
        self.update(id, |todo| {
            let changed = todo.recurrence != recurrence;
            todo.recurrence = recurrence;
            changed
        })
        .await
    }

    // =========================================================================
    // View state
    // =========================================================================

    pub fn set_filter(&mut self, filter: FilterType) -> SaveStatus {
        self.filter = filter;
        self.listeners.notify();
        SaveStatus::ViewOnly
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) -> SaveStatus {
        self.search_term = term.into();
        self.listeners.notify();
        SaveStatus::ViewOnly
    }

    pub fn set_focused_todo_id(&mut self, id: Option<String>) -> SaveStatus {
        self.focused_todo_id = id;
        self.listeners.notify();
        SaveStatus::ViewOnly
    }

    /// Move keyboard focus through the filtered view.
    pub fn move_focus(&mut self, movement: FocusMove) -> SaveStatus {
        let next = {
            let visible = self.filtered_todos();
            if visible.is_empty() {
                return SaveStatus::Unchanged;
            }
            view::next_focus(&visible, self.focused_todo_id.as_deref(), movement)
        };
        if next == self.focused_todo_id {
            return SaveStatus::Unchanged;
        }
        self.set_focused_todo_id(next)
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn focused_todo_id(&self) -> Option<&str> {
        self.focused_todo_id.as_deref()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All tasks in insertion order.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn todo_by_id(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Tasks matching the active filter and search term, in insertion order.
    pub fn filtered_todos(&self) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|t| self.filter.matches(t) && view::matches_search(t, &self.search_term))
            .collect()
    }

    pub fn sorted_filtered_todos(&self, sort: SortOption) -> Vec<&Todo> {
        let mut todos = self.filtered_todos();
        sort.sort(&mut todos);
        todos
    }

    /// Tasks owned by `list_id`. Tasks pointing at a list that no longer exists
    /// are shown under the default list.
    pub fn todos_in_list(&self, list_id: &str, known_list_ids: &[&str]) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|t| {
                t.list_id == list_id
                    || (list_id == DEFAULT_LIST_ID && !known_list_ids.contains(&t.list_id.as_str()))
            })
            .collect()
    }

    pub fn counts(&self) -> TodoCounts {
        let completed = self.todos.iter().filter(|t| t.completed).count();
        TodoCounts {
            total: self.todos.len(),
            completed,
            active: self.todos.len() - completed,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::new_id;

/// The one list that always exists and can never be deleted.
pub const DEFAULT_LIST_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Reserved for multi-user support.
    #[serde(default)]
    pub shared: bool,
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
}

impl TodoList {
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        icon: Option<String>,
        sort_order: u32,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            color: color.into(),
            icon,
            shared: false,
            sort_order,
            created_at: Utc::now(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_LIST_ID
    }
}

/// Lists created on first run: (id, name, color, icon).
const SEED_LISTS: [(&str, &str, &str, &str); 4] = [
    (DEFAULT_LIST_ID, "Tasks", "#3b82f6", "📋"),
    ("personal", "Personal", "#8b5cf6", "👤"),
    ("work", "Work", "#10b981", "💼"),
    ("shopping", "Shopping", "#f59e0b", "🛒"),
];

pub fn default_lists() -> Vec<TodoList> {
    let now = Utc::now();
    SEED_LISTS
        .iter()
        .zip(0u32..)
        .map(|((id, name, color, icon), sort_order)| TodoList {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: Some(icon.to_string()),
            shared: false,
            sort_order,
            created_at: now,
        })
        .collect()
}

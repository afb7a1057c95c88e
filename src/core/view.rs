//! Derived views over the task collection: filters, search and ordering.
//! Nothing here is persisted.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::task::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    #[default]
    All,
    Today,
    MyDay,
    Important,
    Planned,
    AssignedToMe,
}

impl FilterType {
    pub const ALL: &'static [FilterType] = &[
        FilterType::All,
        FilterType::Today,
        FilterType::MyDay,
        FilterType::Important,
        FilterType::Planned,
        FilterType::AssignedToMe,
    ];

    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            // No multi-user support yet, so every task is assigned to the user.
            Self::All | Self::AssignedToMe => true,
            Self::Today | Self::MyDay => todo.my_day,
            Self::Important => todo.is_important(),
            Self::Planned => todo.is_planned(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Today => "Today",
            Self::MyDay => "My Day",
            Self::Important => "Important",
            Self::Planned => "Planned",
            Self::AssignedToMe => "Assigned to me",
        }
    }
}

/// Case-insensitive substring match on the task text. An empty term matches everything.
pub fn matches_search(todo: &Todo, term: &str) -> bool {
    term.is_empty() || todo.text.to_lowercase().contains(&term.to_lowercase())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
    Alphabetical,
}

impl SortOption {
    fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => b.priority.cmp(&a.priority),
            Self::Alphabetical => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
        }
    }

    /// Stable sort: ties keep their incoming order.
    pub fn sort(&self, todos: &mut [&Todo]) {
        todos.sort_by(|a, b| self.compare(a, b));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMove {
    Up,
    Down,
}

/// Where keyboard focus lands after `movement` within `visible`.
///
/// With no current focus the first visible task is focused. A focus that is
/// no longer visible, or that sits at the edge being moved past, stays put.
pub fn next_focus(visible: &[&Todo], current: Option<&str>, movement: FocusMove) -> Option<String> {
    let Some(current) = current else {
        return visible.first().map(|t| t.id.clone());
    };
    let Some(index) = visible.iter().position(|t| t.id == current) else {
        return Some(current.to_string());
    };
    let target = match movement {
        FocusMove::Up => index.saturating_sub(1),
        FocusMove::Down => (index + 1).min(visible.len() - 1),
    };
    Some(visible[target].id.clone())
}

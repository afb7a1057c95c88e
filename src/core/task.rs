use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::list::DEFAULT_LIST_ID;
use super::recurrence::RecurrencePattern;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_list_id() -> String {
    DEFAULT_LIST_ID.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// How a task entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Image,
    Pdf,
}

impl SourceType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Pdf => "PDF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Step {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 payload or a file path.
    pub data: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment fields supplied by the caller; id and upload time are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub name: String,
    pub kind: String,
    pub data: String,
    pub size: u64,
}

impl Attachment {
    pub fn from_new(new: NewAttachment) -> Self {
        Self {
            id: new_id(),
            name: new.name,
            kind: new.kind,
            data: new.data,
            size: new.size,
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,

    #[serde(default = "default_list_id")]
    pub list_id: String,
    #[serde(default)]
    pub my_day: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// AI summary or imported detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Preview payload for imported tasks: a data URL for images, a file name for documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_data: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePattern>,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            completed: false,
            created_at: Utc::now(),
            list_id: default_list_id(),
            my_day: false,
            due_date: None,
            reminder: None,
            priority: Priority::None,
            tags: Vec::new(),
            steps: Vec::new(),
            description: None,
            notes: None,
            source_type: None,
            source_data: None,
            attachments: Vec::new(),
            recurrence: None,
        }
    }

    pub fn is_important(&self) -> bool {
        self.priority > Priority::None
    }

    pub fn is_planned(&self) -> bool {
        self.due_date.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Follow-up occurrence for a recurring task, or `None` when the rule is exhausted.
    pub fn next_occurrence(&self) -> Option<Self> {
        let recurrence = self.recurrence.as_ref()?;
        let due = self.due_date?;
        let next_due = recurrence.next_due(due)?;

        let mut next = Todo::new(self.text.clone());
        next.list_id = self.list_id.clone();
        next.priority = self.priority;
        next.tags = self.tags.clone();
        next.description = self.description.clone();
        next.notes = self.notes.clone();
        next.recurrence = self.recurrence.clone();
        next.steps = self
            .steps
            .iter()
            .map(|s| Step::new(s.text.clone()))
            .collect();
        next.reminder = self
            .reminder
            .and_then(|reminder| next_due.checked_add_signed(reminder - due));
        next.due_date = Some(next_due);
        Some(next)
    }
}

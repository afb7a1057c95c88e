pub mod list;
pub mod recurrence;
pub mod task;
pub mod view;

pub use list::{DEFAULT_LIST_ID, TodoList};
pub use recurrence::{Frequency, RecurrencePattern};
pub use task::{Attachment, NewAttachment, Priority, SourceType, Step, Todo};
pub use view::{FilterType, FocusMove, SortOption};

//! Collaborators that turn outside content into tasks: a line classifier for
//! pasted text and analyzers for images and documents.

pub mod analyzer;
pub mod anthropic;
pub mod parser;

pub use analyzer::{AnalysisResult, AnalyzedTask, AnalyzerError, MockAnalyzer, TaskAnalyzer};
pub use anthropic::AnthropicAnalyzer;
pub use parser::parse_tasks;

use serde::Deserialize;

/// One task candidate for `TodoStore::add_todos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItem {
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_data: Option<String>,
}

impl From<String> for ImportItem {
    fn from(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }
}

impl From<&str> for ImportItem {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

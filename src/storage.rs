//! Document storage for taskdesk
//!
//! Every logical collection lives in one pretty-printed JSON document inside a
//! single application-owned directory:
//!
//! ```text
//! <data_local_dir>/taskdesk/
//!   todos.json      # array of Todo
//!   lists.json      # array of TodoList
//! ```
//!
//! One store instance owns one document, so there is no cross-writer locking.
//! Writes go through a temp file and a rename so readers never observe a
//! half-written document.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Result, StorageError};

pub const APP_DIR_NAME: &str = "taskdesk";
pub const TODOS_DOCUMENT: &str = "todos.json";
pub const LISTS_DOCUMENT: &str = "lists.json";

static DATA_DIR: OnceCell<PathBuf> = OnceCell::new();

/// The platform data directory for taskdesk, resolved once per process.
pub fn default_data_dir() -> &'static Path {
    DATA_DIR.get_or_init(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join(APP_DIR_NAME)
    })
}

/// Reads and writes named JSON documents in one directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Self {
        Self::new(default_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Raw document content. A missing document is `StorageError::NotFound`.
    pub async fn read(&self, name: &str) -> Result<String> {
        let path = self.document_path(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    /// Replace the document, creating the directory first if needed.
    pub async fn write(&self, name: &str, content: String) -> Result<()> {
        let path = self.document_path(name);
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, content.as_bytes()))
            .await
            .map_err(|e| StorageError::Io {
                path: path.clone(),
                source: io::Error::other(e),
            })?
            .map_err(|source| StorageError::Io { path, source })
    }

    pub async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let content = self.read(name).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write(name, json).await
    }
}

/// Sibling `<name>.tmp` used while writing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `data` to `path` via a sibling temp file and a rename. The temp file
/// is removed again if any step fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path(path);
    let result = (|| -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_missing_document_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        let err = storage.read(TODOS_DOCUMENT).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn write_creates_directory_and_document() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path().join("nested").join("data"));

        storage
            .write_json(LISTS_DOCUMENT, &vec!["a", "b"])
            .await
            .unwrap();

        let raw = storage.read(LISTS_DOCUMENT).await.unwrap();
        assert!(raw.contains('\n'), "document should be pretty-printed");
        let back: Vec<String> = storage.read_json(LISTS_DOCUMENT).await.unwrap();
        assert_eq!(back, vec!["a", "b"]);
        assert!(!storage.document_path("lists.tmp").exists());
    }

    #[tokio::test]
    async fn write_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        storage.write(TODOS_DOCUMENT, "[1]".into()).await.unwrap();
        storage.write(TODOS_DOCUMENT, "[2]".into()).await.unwrap();
        assert_eq!(storage.read(TODOS_DOCUMENT).await.unwrap(), "[2]");
    }

    #[tokio::test]
    async fn malformed_document_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        storage.write(TODOS_DOCUMENT, "{not json".into()).await.unwrap();
        let err = storage
            .read_json::<Vec<String>>(TODOS_DOCUMENT)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[tokio::test]
    async fn write_into_file_path_fails_with_io() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let storage = Storage::new(&blocker);

        let err = storage.write(TODOS_DOCUMENT, "[]".into()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn temp_file_sits_next_to_the_document() {
        let dir = Path::new("/data/taskdesk");
        assert_eq!(
            temp_path(&dir.join(TODOS_DOCUMENT)),
            dir.join("todos.json.tmp")
        );
    }

    #[test]
    fn successful_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TODOS_DOCUMENT);
        write_atomic(&path, b"[]").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(!tmp.path().join("todos.json.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        // A non-empty directory in the document's place makes the rename fail.
        let path = tmp.path().join(TODOS_DOCUMENT);
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(write_atomic(&path, b"[]").is_err());
        assert!(!tmp.path().join("todos.json.tmp").exists());
        assert!(path.join("keep").exists());
    }
}

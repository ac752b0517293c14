//! # File-backed database
//!
//! [`FileDatabase`] keeps the tree in a [`MemoryDatabase`] and writes it back
//! to disk after every successful write, so notes survive restarts on desktop.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! └── database.json      # the whole tree, pretty-printed
//! ```
//!
//! The file is replaced atomically (write to `database.json.tmp`, then rename).
//! Writes are serialized: each one is staged against the current tree, the
//! staged tree is written to disk, and only then does it become visible to
//! readers and subscribers. A write that fails to persist changes nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::database::{Database, Subscription};
use crate::error::Result;
use crate::memory::{self, MemoryDatabase, Writes};

const FILE_NAME: &str = "database.json";

#[derive(Clone, Debug)]
pub struct FileDatabase {
    memory: MemoryDatabase,
    file: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl FileDatabase {
    /// Open (or create) the database stored in `base`.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        std::fs::create_dir_all(&base)?;
        let file = base.join(FILE_NAME);
        let root = if file.exists() {
            serde_json::from_slice(&std::fs::read(&file)?)?
        } else {
            Value::Null
        };
        info!(path = %file.display(), "opened file database");
        Ok(Self {
            memory: MemoryDatabase::with_root(root),
            file,
            writer: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    async fn apply(&self, writes: Writes) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let _writer = self.writer.lock().await;
        let staged = self.memory.stage(writes)?;
        self.persist(&staged.root).await?;
        self.memory.commit(staged);
        Ok(())
    }

    async fn persist(&self, root: &Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(root)?;
        let tmp = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}

#[async_trait]
impl Database for FileDatabase {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.memory.read(path)
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.apply(memory::single(path, value)?).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        self.apply(memory::fields(path, fields)?).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        let (key, writes) = memory::child(path, value)?;
        self.apply(writes).await?;
        Ok(key)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        self.memory.watch(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_database_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let db = FileDatabase::open(dir.path()).unwrap();
        let key = db
            .push("users/u1/notes", json!({"title": "Hello from disk"}))
            .await
            .unwrap();

        // Re-open from same directory
        let reopened = FileDatabase::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get(&format!("users/u1/notes/{key}/title")).await.unwrap(),
            Some(json!("Hello from disk"))
        );
    }

    #[tokio::test]
    async fn test_removal_is_persisted() {
        let dir = tempfile::tempdir().unwrap();

        let db = FileDatabase::open(dir.path()).unwrap();
        db.set("users/u1/folders/f1/name", json!("Work")).await.unwrap();
        db.remove("users/u1/folders/f1").await.unwrap();

        let reopened = FileDatabase::open(dir.path()).unwrap();
        assert!(reopened.get("users/u1").await.unwrap().is_none());
        assert!(!dir.path().join("database.json.tmp").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileDatabase::open(dir.path()).unwrap();

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { db.set(&format!("users/u1/notes/n{i}"), json!(i)).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let reopened = FileDatabase::open(dir.path()).unwrap();
        let notes = reopened.get("users/u1/notes").await.unwrap().unwrap();
        assert_eq!(notes.as_object().unwrap().len(), 16);
        assert_eq!(notes, db.get("users/u1/notes").await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_failed_persist_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileDatabase::open(dir.path()).unwrap();
        let mut live = db.subscribe("users/u1/title").await.unwrap();
        assert_eq!(live.next().await, Some(None));

        std::fs::remove_dir_all(dir.path()).unwrap();
        assert!(db.set("users/u1/title", json!("lost")).await.is_err());
        assert!(db.get("users/u1/title").await.unwrap().is_none());

        // The next value a subscriber sees is the next write that persisted
        std::fs::create_dir_all(dir.path()).unwrap();
        db.set("users/u1/title", json!("kept")).await.unwrap();
        assert_eq!(live.next().await, Some(Some(json!("kept"))));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), b"{not json").unwrap();

        assert!(FileDatabase::open(dir.path()).is_err());
    }
}

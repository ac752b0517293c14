//! # Database: the realtime JSON tree every record lives in
//!
//! [`Database`] is the seam between the application and its realtime backend.
//! The backend stores one JSON tree addressed by slash-separated paths
//! (`users/{uid}/notes/{id}`) and pushes changes to live subscribers. Everything
//! else (durability, fan-out to other clients) belongs to the implementation.
//!
//! ## Operations
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`get`](Database::get) | One-shot read of the value at a path, `None` when absent. |
//! | [`set`](Database::set) | Replaces the subtree at a path. Writing `null` removes it. |
//! | [`update`](Database::update) | Multi-path update relative to a base path. Keys may contain `/`; all fields are applied together or not at all. |
//! | [`push`](Database::push) | Stores a value under a freshly generated child key and returns the key. |
//! | [`remove`](Database::remove) | Deletes the subtree at a path. |
//! | [`subscribe`](Database::subscribe) | Opens a [`Subscription`] that yields the current value, then every new value under the path. |
//!
//! Writes are last-writer-wins: there is no version token or compare-and-swap,
//! so concurrent writers to the same field converge to whichever write the
//! database applied last.
//!
//! Implementations live in sibling modules ([`crate::memory`], [`crate::file`]).

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::Result;

#[async_trait]
pub trait Database: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    async fn set(&self, path: &str, value: Value) -> Result<()>;

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()>;

    async fn push(&self, path: &str, value: Value) -> Result<String>;

    async fn remove(&self, path: &str) -> Result<()> {
        self.set(path, Value::Null).await
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription>;
}

/// A standing watch on one path. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<Option<Value>>,
}

impl Subscription {
    pub fn new(path: impl Into<String>, rx: mpsc::UnboundedReceiver<Option<Value>>) -> Self {
        Self {
            path: path.into(),
            rx,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next value. The outer `None` means the database closed the
    /// subscription; the inner `None` means nothing is stored at the path.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        self.rx.recv().await
    }
}

/// Generate a child key for [`Database::push`].
pub fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::debug;

use crate::database::{new_key, Database, Subscription};
use crate::error::{Result, StoreError};
use crate::tree;

/// In-process Database for tests, local use, and as the cache behind [`crate::FileDatabase`].
///
/// Clones share the same tree, so two clones behave like two clients of one backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    offline: bool,
    denied: Vec<Vec<String>>,
    watchers: Vec<Watcher>,
}

#[derive(Debug)]
struct Watcher {
    path: Vec<String>,
    last: Option<Value>,
    tx: mpsc::UnboundedSender<Option<Value>>,
}

impl Inner {
    fn check(&self, path: &[String]) -> Result<()> {
        if self.offline {
            return Err(StoreError::Unavailable);
        }
        if self.denied.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(StoreError::PermissionDenied(path.join("/")));
        }
        Ok(())
    }

    fn notify(&mut self, written: &[Vec<String>]) {
        let root = &self.root;
        self.watchers.retain_mut(|watcher| {
            if watcher.tx.is_closed() {
                return false;
            }
            if !written.iter().any(|path| tree::overlaps(path, &watcher.path)) {
                return true;
            }
            let current = tree::get(root, &watcher.path).cloned();
            if current == watcher.last {
                return true;
            }
            watcher.last = current.clone();
            watcher.tx.send(current).is_ok()
        });
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing tree.
    pub fn with_root(root: Value) -> Self {
        let db = Self::default();
        db.inner.lock().unwrap().root = root;
        db
    }

    /// A copy of the whole tree.
    pub fn snapshot(&self) -> Value {
        self.inner.lock().unwrap().root.clone()
    }

    /// Simulate losing or regaining connectivity. While offline every operation
    /// fails with [`StoreError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.inner.lock().unwrap().offline = !online;
    }

    /// Reject every read and write under `prefix`, the way security rules would.
    pub fn deny(&self, prefix: &str) -> Result<()> {
        let prefix = tree::segments(prefix)?;
        self.inner.lock().unwrap().denied.push(prefix);
        Ok(())
    }

    pub(crate) fn read(&self, path: &str) -> Result<Option<Value>> {
        let path = tree::segments(path)?;
        let inner = self.inner.lock().unwrap();
        inner.check(&path)?;
        Ok(tree::get(&inner.root, &path).cloned())
    }

    /// Apply every write or none of them.
    pub(crate) fn write(&self, writes: Writes) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for (path, _) in &writes {
            inner.check(path)?;
        }
        let written: Vec<Vec<String>> = writes.iter().map(|(path, _)| path.clone()).collect();
        for (path, value) in writes {
            tree::set(&mut inner.root, &path, value);
        }
        inner.notify(&written);
        Ok(())
    }

    /// The tree as it would be after `writes`, without applying them.
    ///
    /// Callers that need the result durable before anyone can observe it
    /// stage, persist, then [`commit`](Self::commit), and must keep other
    /// writers out in between.
    pub(crate) fn stage(&self, writes: Writes) -> Result<Staged> {
        let inner = self.inner.lock().unwrap();
        for (path, _) in &writes {
            inner.check(path)?;
        }
        let mut root = inner.root.clone();
        let written = writes.iter().map(|(path, _)| path.clone()).collect();
        for (path, value) in writes {
            tree::set(&mut root, &path, value);
        }
        Ok(Staged { root, written })
    }

    pub(crate) fn commit(&self, staged: Staged) {
        let mut inner = self.inner.lock().unwrap();
        inner.root = staged.root;
        inner.notify(&staged.written);
    }

    pub(crate) fn watch(&self, path: &str) -> Result<Subscription> {
        let segments = tree::segments(path)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(&segments)?;
        let current = tree::get(&inner.root, &segments).cloned();
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so the initial send cannot fail.
        let _ = tx.send(current.clone());
        inner.watchers.push(Watcher {
            path: segments,
            last: current,
            tx,
        });
        debug!(path, watchers = inner.watchers.len(), "subscribed");
        Ok(Subscription::new(path, rx))
    }
}

pub(crate) type Writes = Vec<(Vec<String>, Value)>;

/// A fully applied copy of the tree, waiting to replace the live one.
#[derive(Debug)]
pub(crate) struct Staged {
    pub(crate) root: Value,
    written: Vec<Vec<String>>,
}

pub(crate) fn single(path: &str, value: Value) -> Result<Writes> {
    Ok(vec![(tree::segments(path)?, value)])
}

/// Multi-path writes relative to `base`. Keys may contain `/`.
pub(crate) fn fields(base: &str, changes: Map<String, Value>) -> Result<Writes> {
    let base = tree::segments(base)?;
    let mut writes = Vec::with_capacity(changes.len());
    for (key, value) in changes {
        let mut path = base.clone();
        path.extend(tree::segments(&key)?);
        writes.push((path, value));
    }
    Ok(writes)
}

/// A write under a fresh child key of `path`. Returns the key with the write.
pub(crate) fn child(path: &str, value: Value) -> Result<(String, Writes)> {
    let mut target = tree::segments(path)?;
    let key = new_key();
    target.push(key.clone());
    Ok((key, vec![(target, value)]))
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.read(path)
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.write(single(path, value)?)
    }

    async fn update(&self, path: &str, changes: Map<String, Value>) -> Result<()> {
        let writes = fields(path, changes)?;
        if writes.is_empty() {
            return Ok(());
        }
        self.write(writes)
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        let (key, writes) = child(path, value)?;
        self.write(writes)?;
        Ok(key)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        self.watch(path)
    }
}

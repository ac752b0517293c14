//! Path addressing inside a JSON value tree.
//!
//! Null leaves and empty objects are never stored: writing `null` removes the
//! subtree, and a parent left empty by a removal is removed as well.

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

/// Split a slash-separated path into keys. `""` and `"/"` address the root.
pub(crate) fn segments(path: &str) -> Result<Vec<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split('/')
        .map(|key| {
            if key.is_empty() || key.contains(FORBIDDEN) {
                Err(StoreError::InvalidPath(path.to_string()))
            } else {
                Ok(key.to_string())
            }
        })
        .collect()
}

pub(crate) fn get<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for key in path {
        node = node.as_object()?.get(key)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

pub(crate) fn set(node: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = prune(value);
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let now_empty = {
            let child = map.entry(head.clone()).or_insert(Value::Null);
            set(child, rest, value);
            is_empty(child)
        };
        if now_empty {
            map.remove(head);
        }
    }
}

/// Whether two paths address overlapping subtrees (one is a prefix of the other).
pub(crate) fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, prune(child)))
                .filter(|(_, child)| !is_empty(child))
                .collect();
            if pruned.is_empty() {
                Value::Null
            } else {
                Value::Object(pruned)
            }
        }
        other => other,
    }
}

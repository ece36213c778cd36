//! The store contract the engine reads and writes through, plus an
//! in-memory implementation.
//!
//! DESIGN
//! ======
//! The engine never caches store contents across calls; every resolution
//! goes back to [`Store::get_value`]. Asynchronous loads are modelled as
//! boxed local futures. [`MemoryStore::fetch`] polls a new load once with a
//! no-op waker and, if it is not ready, parks it until the host calls
//! [`MemoryStore::poll_pending`] on its next cycle.
//!
//! TRADE-OFFS
//! ==========
//! A load that lands after a newer write to the same path is dropped rather
//! than merged. The newer write is the user's latest intent.

use std::collections::HashMap;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};

use crate::path::{Path, Segment};

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

pub type LoadFuture = LocalBoxFuture<'static, Result<Value, String>>;
pub type Loader = Box<dyn FnOnce() -> LoadFuture>;

/// Outcome of [`Store::fetch`].
#[derive(Clone, Debug, PartialEq)]
pub enum Fetched {
    /// The load is in flight. Treat as "no value yet".
    Pending,
    Ready(Value),
    Failed(String),
}

impl Fetched {
    #[must_use]
    pub fn value(self) -> Option<Value> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending | Self::Failed(_) => None,
        }
    }
}

/// Hierarchical key-value store addressed by [`Path`].
pub trait Store {
    fn get_value(&self, path: &Path) -> Option<Value>;

    /// Write `value` at `path`, or remove the entry for `None`. With
    /// `force_notify` observers are told even if the value compares equal,
    /// which matters for containers edited in place.
    fn set_value(&mut self, path: &Path, value: Option<Value>, force_notify: bool);

    /// Return the stored value, or start `loader` and report its state.
    fn fetch(&mut self, path: &Path, loader: Loader) -> Fetched;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn get_value(&self, path: &Path) -> Option<Value> {
        (**self).get_value(path)
    }

    fn set_value(&mut self, path: &Path, value: Option<Value>, force_notify: bool) {
        (**self).set_value(path, value, force_notify);
    }

    fn fetch(&mut self, path: &Path, loader: Loader) -> Fetched {
        (**self).fetch(path, loader)
    }
}

struct PendingLoad {
    future: LoadFuture,
    started_at: u64,
}

/// A [`Store`] over a single JSON tree.
pub struct MemoryStore {
    root: Value,
    revision: u64,
    written_at: HashMap<Path, u64>,
    changes: Vec<Path>,
    pending: HashMap<Path, PendingLoad>,
    errors: HashMap<Path, String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(root: Value) -> Self {
        Self {
            root,
            revision: 0,
            written_at: HashMap::new(),
            changes: Vec::new(),
            pending: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Bumped on every notifying write.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Paths notified since the last call, oldest first.
    pub fn take_changes(&mut self) -> Vec<Path> {
        std::mem::take(&mut self.changes)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn load_error(&self, path: &Path) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Poll every parked load once. Returns the number that settled.
    pub fn poll_pending(&mut self) -> usize {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut settled = Vec::new();
        for (path, load) in &mut self.pending {
            if let Poll::Ready(result) = load.future.poll_unpin(&mut cx) {
                settled.push((path.clone(), load.started_at, result));
            }
        }

        let count = settled.len();
        for (path, started_at, result) in settled {
            self.pending.remove(&path);
            if self.written_at.get(&path).is_some_and(|at| *at > started_at) {
                tracing::debug!(%path, "dropping stale load result");
                continue;
            }
            self.settle(&path, result);
        }
        count
    }

    fn settle(&mut self, path: &Path, result: Result<Value, String>) -> Fetched {
        match result {
            Ok(value) => {
                self.set_value(path, Some(value.clone()), false);
                Fetched::Ready(value)
            }
            Err(err) => {
                tracing::warn!(%path, %err, "load failed");
                self.errors.insert(path.clone(), err.clone());
                Fetched::Failed(err)
            }
        }
    }
}

impl Store for MemoryStore {
    fn get_value(&self, path: &Path) -> Option<Value> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = match (segment, node) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(node.clone())
    }

    fn set_value(&mut self, path: &Path, value: Option<Value>, force_notify: bool) {
        let changed = match value {
            Some(value) => write_at(&mut self.root, path.segments(), value),
            None => remove_at(&mut self.root, path.segments()),
        };
        self.errors.remove(path);
        self.revision += 1;
        self.written_at.insert(path.clone(), self.revision);
        if changed || force_notify {
            self.changes.push(path.clone());
        }
    }

    fn fetch(&mut self, path: &Path, loader: Loader) -> Fetched {
        if let Some(value) = self.get_value(path) {
            return Fetched::Ready(value);
        }
        if let Some(err) = self.errors.get(path) {
            return Fetched::Failed(err.clone());
        }
        if self.pending.contains_key(path) {
            return Fetched::Pending;
        }

        let mut future = loader();
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        match future.poll_unpin(&mut cx) {
            Poll::Ready(result) => self.settle(path, result),
            Poll::Pending => {
                self.pending.insert(
                    path.clone(),
                    PendingLoad {
                        future,
                        started_at: self.revision,
                    },
                );
                Fetched::Pending
            }
        }
    }
}

/// How far past the end of an array a write may land; the gap is null-filled.
const MAX_INDEX_GAP: usize = 1024;

/// Write `value`, creating missing containers. Returns whether anything changed.
fn write_at(node: &mut Value, segments: &[Segment], value: Value) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        if *node == value {
            return false;
        }
        *node = value;
        return true;
    };
    let child = match head {
        Segment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else { return false };
            map.entry(key.clone()).or_insert(Value::Null)
        }
        Segment::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let Value::Array(items) = node else { return false };
            if *index > items.len().saturating_add(MAX_INDEX_GAP) {
                tracing::warn!(index, len = items.len(), "array index too far past the end; write dropped");
                return false;
            }
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            &mut items[*index]
        }
    };
    write_at(child, rest, value)
}

/// Remove the entry at `segments`. Array slots are nulled so later indexes
/// keep their meaning.
fn remove_at(node: &mut Value, segments: &[Segment]) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        let changed = !node.is_null();
        *node = Value::Null;
        return changed;
    };
    let mut parent = node;
    for segment in parents {
        parent = match (segment, parent) {
            (Segment::Key(key), Value::Object(map)) => match map.get_mut(key) {
                Some(child) => child,
                None => return false,
            },
            (Segment::Index(index), Value::Array(items)) => match items.get_mut(*index) {
                Some(child) => child,
                None => return false,
            },
            _ => return false,
        };
    }
    match (last, parent) {
        (Segment::Key(key), Value::Object(map)) => map.remove(key).is_some(),
        (Segment::Index(index), Value::Array(items)) => match items.get_mut(*index) {
            Some(slot) if !slot.is_null() => {
                *slot = Value::Null;
                true
            }
            _ => false,
        },
        _ => false,
    }
}

//! The fetch-readiness flag.
//!
//! A keystroke clears the flag and a finished edit sets it, so whatever
//! syncs the store to a backend acts once per completed edit. A discrete
//! choice (checkbox, radio) is a finished edit on its own. The engine only
//! writes the flag; it never talks to a network.

use serde_json::Value;

use crate::control::{Category, EditKind};
use crate::path::Path;
use crate::store::Store;

#[cfg(test)]
#[path = "trigger_test.rs"]
mod trigger_test;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTrigger {
    flag: Path,
}

impl FetchTrigger {
    #[must_use]
    pub fn new(flag: Path) -> Self {
        Self { flag }
    }

    #[must_use]
    pub fn flag(&self) -> &Path {
        &self.flag
    }

    #[must_use]
    pub fn should_fetch(kind: EditKind, category: Category) -> bool {
        kind.is_terminal() || category.is_discrete()
    }

    /// Record an edit and return the flag's new state.
    pub fn on_edit<S: Store + ?Sized>(&self, store: &mut S, kind: EditKind, category: Category) -> bool {
        let ready = Self::should_fetch(kind, category);
        tracing::trace!(flag = %self.flag, ready, kind = kind.as_str(), "fetch flag");
        store.set_value(&self.flag, Some(Value::Bool(ready)), false);
        ready
    }

    #[must_use]
    pub fn is_set<S: Store + ?Sized>(&self, store: &S) -> bool {
        store
            .get_value(&self.flag)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

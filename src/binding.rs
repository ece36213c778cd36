//! Binding fields to store locations.
//!
//! DESIGN
//! ======
//! A [`BoundField`] names one editable value: the object at `path`, the
//! property `prop` on it, and a control type tag. The [`Binder`] owns the
//! store handle and resolves a field through a fixed chain every time it is
//! asked: an explicit item, then the store, then the field default, then
//! the type's category default. Nothing is cached between calls.
//!
//! Edits go through [`Binder::commit`]. The parsed value is written at the
//! field's `proppath`; the literal text goes to a parallel `<prop>_raw`
//! entry whenever parsing lost or rejected something, so a half-typed or
//! malformed value is never silently dropped. A finished edit that parses
//! clears the shadow.
//!
//! TRADE-OFFS
//! ==========
//! Monetary values keep their typed text inside the stored object, so the
//! binder writes no separate shadow for them.

use std::fmt;
use std::sync::Arc;

use money::MigrationReport;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::control::{
    Category, ControlKind, EditKind, Options, ParseContext, Parsed, RawInput, Registry, TypeDescriptor, ValidateFn,
};
use crate::error::BindError;
use crate::money_control;
use crate::path::Path;
use crate::store::{Fetched, Loader, Store};
use crate::trigger::FetchTrigger;
use crate::validate::{self, REQUIRED_MESSAGE, is_blank};

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

const RAW_SUFFIX: &str = "_raw";

// =============================================================================
// FIELDS
// =============================================================================

/// One editable value. Cheap to build; rebuild it whenever the caller's
/// inputs change.
#[derive(Clone)]
pub struct BoundField {
    pub path: Path,
    pub prop: String,
    pub tag: String,
    pub default: Option<Value>,
    /// Object to read `prop` from ahead of the store.
    pub item: Option<Value>,
    pub options: Option<Options>,
    pub validator: Option<ValidateFn>,
    /// Per-field override of the https check for url and image fields.
    pub https: Option<bool>,
    pub required: bool,
}

impl BoundField {
    #[must_use]
    pub fn new(path: Path, prop: impl Into<String>, kind: ControlKind) -> Self {
        Self::with_tag(path, prop, kind.tag())
    }

    /// A field of a host-registered control type.
    #[must_use]
    pub fn with_tag(path: Path, prop: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            path,
            prop: prop.into(),
            tag: tag.into(),
            default: None,
            item: None,
            options: None,
            validator: None,
            https: None,
            required: false,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn item(mut self, item: Value) -> Self {
        self.item = Some(item);
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl Into<Options>) -> Self {
        self.options = Some(options.into());
        self
    }

    #[must_use]
    pub fn validator(mut self, f: impl Fn(Option<&Value>, Option<&str>) -> Option<String> + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn https(mut self, required: bool) -> Self {
        self.https = Some(required);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// `path` with `prop` appended.
    #[must_use]
    pub fn proppath(&self) -> Path {
        self.path.child(self.prop.as_str())
    }

    /// Where the literal input is shadowed. A prop that is itself a shadow
    /// has none, so there is never a `_raw_raw`.
    #[must_use]
    pub fn raw_path(&self) -> Option<Path> {
        if self.prop.ends_with(RAW_SUFFIX) {
            return None;
        }
        Some(self.path.child(format!("{}{RAW_SUFFIX}", self.prop)))
    }

    fn checked_proppath(&self) -> Result<Path, BindError> {
        if self.prop.is_empty() {
            tracing::error!(path = %self.path, "bound field has an empty prop");
            return Err(BindError::InvalidPath(format!("{}: empty prop", self.path)));
        }
        Ok(self.proppath())
    }
}

impl fmt::Debug for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("path", &self.path)
            .field("prop", &self.prop)
            .field("tag", &self.tag)
            .field("default", &self.default)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A field's current state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub value: Option<Value>,
    pub raw: Option<String>,
    pub error: Option<String>,
}

/// A field that should block submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub path: Path,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Passed to the save hook after every commit.
#[derive(Debug)]
pub struct SaveEvent<'a> {
    pub path: &'a Path,
    pub prop: &'a str,
    pub value: Option<&'a Value>,
    pub kind: EditKind,
}

pub type SaveHook = Box<dyn FnMut(&SaveEvent<'_>)>;

// =============================================================================
// BINDER
// =============================================================================

pub struct Binder<S> {
    store: S,
    registry: Arc<Registry>,
    config: EngineConfig,
    trigger: FetchTrigger,
    save_hook: Option<SaveHook>,
}

impl<S: Store> Binder<S> {
    /// A binder over the built-in control types with default config.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, Registry::builtin(), EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(store: S, registry: Arc<Registry>, config: EngineConfig) -> Self {
        let trigger = FetchTrigger::new(config.fetch_flag.clone());
        Self {
            store,
            registry,
            config,
            trigger,
            save_hook: None,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn trigger(&self) -> &FetchTrigger {
        &self.trigger
    }

    /// Call `hook` after every commit, e.g. to queue a backend save.
    pub fn on_save(&mut self, hook: impl FnMut(&SaveEvent<'_>) + 'static) {
        self.save_hook = Some(Box::new(hook));
    }

    /// Current value, raw shadow and validation message.
    ///
    /// # Errors
    ///
    /// `UnknownType` for an unregistered tag, `InvalidPath` for an empty prop.
    pub fn resolve(&self, field: &BoundField) -> Result<Resolution, BindError> {
        let descriptor = self.registry.resolve(&field.tag)?;
        let proppath = field.checked_proppath()?;
        let stored = self.store.get_value(&proppath);
        Ok(self.resolution(field, &descriptor, stored))
    }

    /// [`Binder::resolve`], starting `loader` when the store has nothing yet.
    /// A load still in flight reads as no value; resolve again once the
    /// store reports it settled.
    ///
    /// # Errors
    ///
    /// See [`Binder::resolve`].
    pub fn resolve_or_fetch(&mut self, field: &BoundField, loader: Loader) -> Result<Resolution, BindError> {
        let descriptor = self.registry.resolve(&field.tag)?;
        let proppath = field.checked_proppath()?;
        let stored = match self.store.fetch(&proppath, loader) {
            Fetched::Ready(value) => Some(value),
            Fetched::Pending => None,
            Fetched::Failed(err) => {
                tracing::debug!(path = %proppath, %err, "fetch failed; resolving without it");
                None
            }
        };
        Ok(self.resolution(field, &descriptor, stored))
    }

    fn resolution(&self, field: &BoundField, descriptor: &TypeDescriptor, stored: Option<Value>) -> Resolution {
        let from_item = field
            .item
            .as_ref()
            .and_then(|item| item.get(&field.prop))
            .filter(|v| !v.is_null())
            .cloned();
        let value = from_item
            .or_else(|| stored.filter(|v| !v.is_null()))
            .or_else(|| field.default.clone())
            .or_else(|| descriptor.category.default_value());
        let raw = self.raw_value(field);
        let error = self.validate(field, descriptor, value.as_ref(), raw.as_deref());
        Resolution { value, raw, error }
    }

    /// The raw shadow's text, if any.
    #[must_use]
    pub fn raw_value(&self, field: &BoundField) -> Option<String> {
        let raw_path = field.raw_path()?;
        match self.store.get_value(&raw_path)? {
            Value::String(text) => Some(text),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn validate(
        &self,
        field: &BoundField,
        descriptor: &TypeDescriptor,
        value: Option<&Value>,
        raw: Option<&str>,
    ) -> Option<String> {
        let require_https = field.https.unwrap_or(self.config.require_https);
        validate::validate(field.validator.as_ref(), &descriptor.check, require_https, value, raw)
    }

    /// Apply a user edit: parse it, write the value and raw shadow, set the
    /// fetch flag, then run the save hook. A bad edit is an
    /// [`Parsed::Invalid`] outcome, not an error.
    ///
    /// # Errors
    ///
    /// `UnknownType`, `InvalidPath`, or `MissingOptions` for an option-backed
    /// control configured without options.
    pub fn commit(&mut self, field: &BoundField, raw: impl Into<RawInput>, kind: EditKind) -> Result<Parsed, BindError> {
        let descriptor = self.registry.resolve(&field.tag)?;
        let proppath = field.checked_proppath()?;
        if descriptor.requires_options && field.options.is_none() {
            tracing::error!(prop = %field.prop, tag = %field.tag, "categorical control without options");
            return Err(BindError::MissingOptions {
                prop: field.prop.clone(),
                tag: field.tag.clone(),
            });
        }

        let raw = raw.into();
        let current = self.store.get_value(&proppath).filter(|v| !v.is_null());
        let cx = ParseContext {
            tag: &field.tag,
            kind,
            options: field.options.as_ref(),
            current: current.as_ref(),
            default_currency: self.config.default_currency.as_deref(),
        };
        let parsed = descriptor.parse(&raw, &cx);
        let category = descriptor.category;
        let finished = kind.is_terminal() || category.is_discrete();

        match &parsed {
            Parsed::Value(value) => {
                let force = matches!(category, Category::Composite | Category::Structured);
                self.store.set_value(&proppath, Some(value.clone()), force);
                if category != Category::Composite {
                    let literal = raw.literal();
                    if finished || literal == canonical_text(value) {
                        self.clear_raw(field);
                    } else {
                        self.write_raw(field, literal);
                    }
                }
            }
            Parsed::Unset => {
                self.store.set_value(&proppath, None, false);
                self.clear_raw(field);
            }
            Parsed::Invalid(err) => {
                tracing::debug!(path = %proppath, %err, "edit did not parse; keeping raw text");
                self.store.set_value(&proppath, None, false);
                self.write_raw(field, raw.literal());
            }
        }

        self.trigger.on_edit(&mut self.store, kind, category);
        if let Some(hook) = self.save_hook.as_mut() {
            hook(&SaveEvent {
                path: &field.path,
                prop: &field.prop,
                value: parsed.value(),
                kind,
            });
        }
        Ok(parsed)
    }

    fn write_raw(&mut self, field: &BoundField, literal: String) {
        if let Some(raw_path) = field.raw_path() {
            tracing::debug!(path = %raw_path, "raw shadow written");
            self.store.set_value(&raw_path, Some(Value::String(literal)), false);
        }
    }

    fn clear_raw(&mut self, field: &BoundField) {
        if let Some(raw_path) = field.raw_path() {
            if self.store.get_value(&raw_path).is_some() {
                self.store.set_value(&raw_path, None, false);
            }
        }
    }

    /// Every field that should block a submit: validation messages first,
    /// then required fields left blank.
    ///
    /// # Errors
    ///
    /// The first configuration error any field raises.
    pub fn check_submit(&self, fields: &[BoundField]) -> Result<Vec<FieldError>, BindError> {
        let mut errors = Vec::new();
        for field in fields {
            let resolution = self.resolve(field)?;
            let message = match resolution.error {
                Some(message) => message,
                None if field.required && is_blank(resolution.value.as_ref()) => REQUIRED_MESSAGE.to_owned(),
                None => continue,
            };
            errors.push(FieldError {
                path: field.proppath(),
                message,
            });
        }
        Ok(errors)
    }

    /// Rewrite a stored monetary value in canonical form, dropping legacy
    /// fields. Returns `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// `InvalidPath`, or `Money` when the stored value is not monetary.
    pub fn migrate_money(&mut self, field: &BoundField) -> Result<Option<MigrationReport>, BindError> {
        let proppath = field.checked_proppath()?;
        let Some(stored) = self.store.get_value(&proppath).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let (canonical, report) = money_control::canonicalize(&stored)?;
        if canonical != stored {
            tracing::info!(path = %proppath, steps = report.steps.len(), "stored money rewritten in canonical form");
            self.store.set_value(&proppath, Some(canonical), true);
        }
        Ok(Some(report))
    }
}

/// How a parsed value reads back as text.
fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

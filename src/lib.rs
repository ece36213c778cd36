//! Path-addressed value binding and normalization for form fields.
//!
//! A caller declares a [`BoundField`] (store path, property, control type).
//! The [`Binder`] resolves its current value from the [`Store`], parses user
//! edits through the type's parser from the [`Registry`], keeps the literal
//! input in a `_raw` shadow when parsing loses something, validates, and
//! flips a store flag that tells a sync layer when an edit is finished.
//!
//! Monetary fields are backed by the [`money`] crate, re-exported here.

pub mod binding;
pub mod config;
pub mod control;
pub mod error;
pub mod money_control;
pub mod normalize;
pub mod path;
pub mod selection;
pub mod store;
pub mod trigger;
pub mod validate;

pub use binding::{Binder, BoundField, FieldError, Resolution, SaveEvent, SaveHook};
pub use config::{ConfigError, EngineConfig};
pub use control::{
    Category, ControlKind, DefaultCheck, EditKind, Options, ParseContext, ParseError, ParseFn, Parsed, RawInput,
    Registry, TypeDescriptor, ValidateFn,
};
pub use error::{BindError, ErrorCode};
pub use money;
pub use path::{Path, Segment};
pub use store::{Fetched, LoadFuture, Loader, MemoryStore, Store};
pub use trigger::FetchTrigger;

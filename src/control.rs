//! Control types: what kind of value a bound field holds and how raw input
//! becomes that value.
//!
//! DESIGN
//! ======
//! The built-in kinds form a closed enum, [`ControlKind`], whose
//! [`ControlKind::descriptor`] is an exhaustive table, so adding a kind
//! without a parser does not compile. Hosts add their own kinds at runtime
//! through [`Registry::register`], keyed by tag like the built-ins.
//!
//! A registry is built whole and then shared read-only. Resolution never
//! races registration: [`Registry::with_builtins`] registers every built-in
//! kind before returning.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::BindError;
use crate::{money_control, normalize, selection};

#[cfg(test)]
#[path = "control_test.rs"]
mod control_test;

// =============================================================================
// KINDS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Text,
    Textarea,
    Password,
    Email,
    Color,
    Url,
    Img,
    ImgUpload,
    Number,
    Year,
    Date,
    Checkbox,
    YesNo,
    Radio,
    Select,
    Checkboxes,
    CheckboxArray,
    CheckboxObject,
    Autocomplete,
    ArrayText,
    Json,
    Money,
    Location,
    Address,
    Postcode,
}

impl ControlKind {
    pub const ALL: [Self; 25] = [
        Self::Text,
        Self::Textarea,
        Self::Password,
        Self::Email,
        Self::Color,
        Self::Url,
        Self::Img,
        Self::ImgUpload,
        Self::Number,
        Self::Year,
        Self::Date,
        Self::Checkbox,
        Self::YesNo,
        Self::Radio,
        Self::Select,
        Self::Checkboxes,
        Self::CheckboxArray,
        Self::CheckboxObject,
        Self::Autocomplete,
        Self::ArrayText,
        Self::Json,
        Self::Money,
        Self::Location,
        Self::Address,
        Self::Postcode,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Password => "password",
            Self::Email => "email",
            Self::Color => "color",
            Self::Url => "url",
            Self::Img => "img",
            Self::ImgUpload => "imgUpload",
            Self::Number => "number",
            Self::Year => "year",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::YesNo => "yesNo",
            Self::Radio => "radio",
            Self::Select => "select",
            Self::Checkboxes => "checkboxes",
            Self::CheckboxArray => "checkboxArray",
            Self::CheckboxObject => "checkboxObject",
            Self::Autocomplete => "autocomplete",
            Self::ArrayText => "arraytext",
            Self::Json => "json",
            Self::Money => "Money",
            Self::Location => "location",
            Self::Address => "address",
            Self::Postcode => "postcode",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Self::Text
            | Self::Textarea
            | Self::Password
            | Self::Email
            | Self::Color
            | Self::Url
            | Self::Img
            | Self::ImgUpload
            | Self::Autocomplete
            | Self::Location
            | Self::Address
            | Self::Postcode => Category::Text,
            Self::Number | Self::Year => Category::Numeric,
            Self::Date => Category::Date,
            Self::YesNo | Self::Radio | Self::Select | Self::Checkboxes | Self::CheckboxArray | Self::CheckboxObject => {
                Category::Categorical
            }
            Self::Checkbox => Category::Binary,
            Self::ArrayText | Self::Json => Category::Structured,
            Self::Money => Category::Composite,
        }
    }

    /// The built-in descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> TypeDescriptor {
        let (parse, check): (ParseFn, DefaultCheck) = match self {
            Self::Text | Self::Textarea => (normalize::parse_text, DefaultCheck::None),
            Self::Password
            | Self::Email
            | Self::Color
            | Self::Autocomplete
            | Self::Location
            | Self::Address
            | Self::Postcode => (normalize::parse_plain, DefaultCheck::None),
            Self::Url => (normalize::parse_url, DefaultCheck::SecureUrl),
            Self::Img | Self::ImgUpload => (normalize::parse_plain, DefaultCheck::SecureUrl),
            Self::Number => (normalize::parse_number, DefaultCheck::None),
            Self::Year => (normalize::parse_year, DefaultCheck::None),
            Self::Date => (normalize::parse_date, DefaultCheck::DateFormat),
            Self::Checkbox => (normalize::parse_checkbox, DefaultCheck::None),
            Self::YesNo => (normalize::parse_yes_no, DefaultCheck::None),
            Self::Radio | Self::Select => (selection::parse_single, DefaultCheck::None),
            Self::Checkboxes | Self::CheckboxArray => (selection::parse_toggle_array, DefaultCheck::None),
            Self::CheckboxObject => (selection::parse_toggle_object, DefaultCheck::None),
            Self::ArrayText => (normalize::parse_arraytext, DefaultCheck::None),
            Self::Json => (normalize::parse_json, DefaultCheck::None),
            Self::Money => (money_control::parse_money, money_control::check()),
        };
        let requires_options = matches!(
            self,
            Self::Radio | Self::Select | Self::Checkboxes | Self::CheckboxArray | Self::CheckboxObject
        );
        TypeDescriptor {
            tag: self.tag().to_owned(),
            category: self.category(),
            parse,
            check,
            requires_options,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Text,
    Numeric,
    Date,
    Categorical,
    Binary,
    Structured,
    Composite,
}

impl Category {
    /// Value a field reads as when nothing is stored and no default is given.
    #[must_use]
    pub fn default_value(self) -> Option<Value> {
        match self {
            Self::Binary => Some(Value::Bool(false)),
            Self::Text => Some(Value::String(String::new())),
            Self::Numeric | Self::Date | Self::Categorical | Self::Structured | Self::Composite => None,
        }
    }

    /// A discrete choice is itself a finished edit.
    #[must_use]
    pub fn is_discrete(self) -> bool {
        matches!(self, Self::Binary | Self::Categorical)
    }
}

// =============================================================================
// EDITS
// =============================================================================

/// How far along an edit is. `Change` is a keystroke; `Blur` and `Commit`
/// end the edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Change,
    Blur,
    Commit,
}

impl EditKind {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Blur | Self::Commit)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Blur => "blur",
            Self::Commit => "commit",
        }
    }
}

impl FromStr for EditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" | "input" => Ok(Self::Change),
            "blur" => Ok(Self::Blur),
            "commit" | "submit" => Ok(Self::Commit),
            other => Err(format!("unknown edit kind: {other}")),
        }
    }
}

/// A user edit before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawInput {
    /// Typed text, or a chosen token for a single-choice control.
    Text(String),
    /// New state of a single checkbox.
    Checked(bool),
    /// An option clicked in a multi-select; flips its membership.
    Toggle(String),
}

impl RawInput {
    /// The literal form kept in a raw shadow.
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::Text(text) | Self::Toggle(text) => text.clone(),
            Self::Checked(checked) => checked.to_string(),
        }
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for RawInput {
    fn from(checked: bool) -> Self {
        Self::Checked(checked)
    }
}

/// A bad edit. This is a data outcome; the raw text is kept and the field
/// reads as unset.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot read '{raw}' as {expected}")]
pub struct ParseError {
    pub raw: String,
    pub expected: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Parsed {
    /// Blank input: clear the field.
    Unset,
    Value(Value),
    Invalid(ParseError),
}

impl Parsed {
    pub(crate) fn invalid(raw: &str, expected: &'static str) -> Self {
        Self::Invalid(ParseError {
            raw: raw.to_owned(),
            expected,
        })
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unset | Self::Invalid(_) => None,
        }
    }
}

/// The allowed choices of a categorical field.
#[derive(Clone)]
pub enum Options {
    List(Vec<Value>),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Options {
    #[must_use]
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Map an incoming token to its option value. Tokens arrive as text, so
    /// `"2"` matches the option `2`.
    #[must_use]
    pub fn coerce(&self, token: &str) -> Option<Value> {
        match self {
            Self::List(options) => options.iter().find(|option| token_of(option) == token).cloned(),
            Self::Predicate(accepts) => accepts(token).then(|| Value::String(token.to_owned())),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(options) => f.debug_tuple("List").field(options).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Vec<Value>> for Options {
    fn from(options: Vec<Value>) -> Self {
        Self::List(options)
    }
}

/// Text form of an option, as it would arrive from an input.
pub(crate) fn token_of(option: &Value) -> String {
    match option {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Everything a parser may look at besides the raw input.
#[derive(Clone, Copy, Debug)]
pub struct ParseContext<'a> {
    pub tag: &'a str,
    pub kind: EditKind,
    pub options: Option<&'a Options>,
    /// The field's value before this edit.
    pub current: Option<&'a Value>,
    pub default_currency: Option<&'a str>,
}

impl<'a> ParseContext<'a> {
    #[must_use]
    pub fn new(tag: &'a str, kind: EditKind) -> Self {
        Self {
            tag,
            kind,
            options: None,
            current: None,
            default_currency: None,
        }
    }
}

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// `(raw input, context) -> model value`. Pure: never touches the store.
pub type ParseFn = fn(&RawInput, &ParseContext<'_>) -> Parsed;

/// `(value, raw value) -> error message`.
pub type ValidateFn = Arc<dyn Fn(Option<&Value>, Option<&str>) -> Option<String> + Send + Sync>;

/// Validation a type applies when the caller supplies none.
#[derive(Clone)]
pub enum DefaultCheck {
    None,
    DateFormat,
    SecureUrl,
    Custom(ValidateFn),
}

impl fmt::Debug for DefaultCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::DateFormat => f.write_str("DateFormat"),
            Self::SecureUrl => f.write_str("SecureUrl"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How one control type parses and validates.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub tag: String,
    pub category: Category,
    pub parse: ParseFn,
    pub check: DefaultCheck,
    pub requires_options: bool,
}

impl TypeDescriptor {
    #[must_use]
    pub fn new(tag: impl Into<String>, category: Category, parse: ParseFn) -> Self {
        Self {
            tag: tag.into(),
            category,
            parse,
            check: DefaultCheck::None,
            requires_options: false,
        }
    }

    #[must_use]
    pub fn with_check(mut self, check: DefaultCheck) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub fn with_required_options(mut self) -> Self {
        self.requires_options = true;
        self
    }

    #[must_use]
    pub fn parse(&self, raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
        (self.parse)(raw, cx)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("category", &self.category)
            .field("check", &self.check)
            .field("requires_options", &self.requires_options)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Tag to descriptor. Descriptors are immutable once registered; registering
/// a tag again replaces the entry.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl Registry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        normalize::register(&mut registry);
        selection::register(&mut registry);
        money_control::register(&mut registry);
        registry
    }

    /// A process-wide registry of the built-in kinds.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        static BUILTIN: OnceLock<Arc<Registry>> = OnceLock::new();
        BUILTIN.get_or_init(|| Arc::new(Self::with_builtins())).clone()
    }

    /// Add or replace a type. Returns the descriptor it replaced.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        let previous = self.types.insert(descriptor.tag.clone(), Arc::new(descriptor));
        if let Some(previous) = &previous {
            tracing::debug!(tag = %previous.tag, "control type replaced");
        }
        previous
    }

    /// # Errors
    ///
    /// Returns `UnknownType` if `tag` was never registered.
    pub fn resolve(&self, tag: &str) -> Result<Arc<TypeDescriptor>, BindError> {
        self.types.get(tag).cloned().ok_or_else(|| {
            tracing::error!(tag, "unknown control type");
            BindError::UnknownType(tag.to_owned())
        })
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.types.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

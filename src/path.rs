//! Immutable store addresses.
//!
//! A [`Path`] is a shared, structurally compared list of segments. Appending
//! builds a new path; the original is never touched, so paths can be handed
//! out freely and compared by value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BindError;

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;

/// One step into the store: an object key or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path(Arc<[Segment]>);

impl Path {
    /// The empty path, addressing the store root.
    #[must_use]
    pub fn root() -> Self {
        Self(Arc::from(Vec::new()))
    }

    #[must_use]
    pub fn new<S: Into<Segment>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::<Segment>::into).collect())
    }

    /// Build from segments that may be missing. A missing segment is a
    /// configuration mistake and is reported, never skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` naming the position of the first missing segment.
    pub fn try_from_segments(segments: impl IntoIterator<Item = Option<Segment>>) -> Result<Self, BindError> {
        let mut out = Vec::new();
        for (i, segment) in segments.into_iter().enumerate() {
            let Some(segment) = segment else {
                tracing::error!(position = i, "path has an unset segment");
                return Err(BindError::InvalidPath(format!("unset segment at position {i}")));
            };
            out.push(segment);
        }
        Ok(Self(out.into()))
    }

    /// Build from a JSON array of strings and non-negative integers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for a non-array, or an element that is null or
    /// not a string/index.
    pub fn from_json(value: &Value) -> Result<Self, BindError> {
        let Some(items) = value.as_array() else {
            return Err(BindError::InvalidPath(format!("expected an array, got {value}")));
        };
        let mut segments = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(key) => segments.push(Some(Segment::Key(key.clone()))),
                Value::Number(n) => {
                    let index = n
                        .as_u64()
                        .and_then(|v| usize::try_from(v).ok())
                        .ok_or_else(|| BindError::InvalidPath(format!("bad index {n} at position {i}")))?;
                    segments.push(Some(Segment::Index(index)));
                }
                Value::Null => segments.push(None),
                other => return Err(BindError::InvalidPath(format!("bad segment {other} at position {i}"))),
            }
        }
        Self::try_from_segments(segments)
    }

    /// Parse `a.b.c` into key segments. Empty text is the root path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for an empty segment such as `a..b`.
    pub fn from_dotted(text: &str) -> Result<Self, BindError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        Self::try_from_segments(
            text.split('.')
                .map(|key| (!key.is_empty()).then(|| Segment::Key(key.to_owned()))),
        )
    }

    /// A new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.to_vec();
        segments.push(segment.into());
        Self(segments.into())
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.into()))
    }

    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// `path!["draft", "items", 0]`
#[macro_export]
macro_rules! path {
    () => { $crate::path::Path::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::Path::new([$($crate::path::Segment::from($seg)),+])
    };
}

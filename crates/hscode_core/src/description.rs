//! Hierarchical description breadcrumbs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Separator placed between hierarchy levels when a description is
/// rendered or persisted.
pub const LEVEL_SEPARATOR: &str = " → ";

/// The hierarchy of labels above a code, from the top-level section down to
/// the node itself.
///
/// Internally a list of labels; it only becomes a joined string when it is
/// displayed or serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Description {
    labels: Vec<String>,
}

impl Description {
    /// Creates a description from an ordered list of labels.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a single-level description.
    pub fn single(label: impl Into<String>) -> Self {
        Self {
            labels: vec![label.into()],
        }
    }

    /// Parses a joined breadcrumb string.
    ///
    /// Empty segments are dropped, so an empty string parses to an empty
    /// description.
    pub fn from_joined(joined: &str) -> Self {
        Self {
            labels: joined
                .split(LEVEL_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns the labels, outermost first.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the innermost label.
    pub fn leaf(&self) -> Option<&str> {
        self.labels.last().map(String::as_str)
    }

    /// Returns the number of hierarchy levels.
    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns a new description with `label` appended as the innermost level.
    #[must_use]
    pub fn child(&self, label: impl Into<String>) -> Self {
        let mut labels = self.labels.clone();
        labels.push(label.into());
        Self { labels }
    }

    /// Joins the labels with [`LEVEL_SEPARATOR`].
    pub fn joined(&self) -> String {
        self.labels.join(LEVEL_SEPARATOR)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl Serialize for Description {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.joined())
    }
}

impl<'de> Deserialize<'de> for Description {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(Self::from_joined(&joined))
    }
}

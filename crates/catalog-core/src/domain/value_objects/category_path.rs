//! Hierarchical category path stored in a PostgreSQL `ltree` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned for malformed `ltree` paths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryPathError {
    #[error("category path must not be empty")]
    Empty,
    #[error("invalid ltree label '{0}'")]
    InvalidLabel(String),
}

/// Dot-separated sequence of labels, root first.
///
/// Each label matches `[A-Za-z0-9_]{1,256}`. A category's path is its
/// parent's path followed by its own label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryPath(String);

impl CategoryPath {
    /// Parses and validates a path.
    pub fn parse(path: impl Into<String>) -> Result<Self, CategoryPathError> {
        let path = path.into();
        if path.is_empty() {
            return Err(CategoryPathError::Empty);
        }
        for label in path.split('.') {
            validate_label(label)?;
        }
        Ok(Self(path))
    }

    /// Path of a root category.
    pub fn root(label: &str) -> Result<Self, CategoryPathError> {
        validate_label(label)?;
        Ok(Self(label.to_string()))
    }

    /// Path of a child of `parent`.
    pub fn child(parent: &Self, label: &str) -> Result<Self, CategoryPathError> {
        validate_label(label)?;
        Ok(Self(format!("{}.{label}", parent.0)))
    }

    /// Builds a path under an optional parent.
    pub fn under(parent: Option<&Self>, label: &str) -> Result<Self, CategoryPathError> {
        match parent {
            Some(parent) => Self::child(parent, label),
            None => Self::root(label),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Labels from root to leaf.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Last label of the path.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Number of labels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.labels().count()
    }

    /// Path of the parent, `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(parent, _)| Self(parent.to_string()))
    }

    /// True when `self` lies strictly below `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        self.0.len() > other.0.len()
            && self.0.starts_with(other.as_str())
            && self.0.as_bytes()[other.0.len()] == b'.'
    }

    /// True when `self` lies strictly above `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.is_descendant_of(self)
    }

    /// True when `self` equals `other` or lies below it (ltree `<@`).
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self == other || self.is_descendant_of(other)
    }

    /// Replaces the `old_prefix` of this path with `new_prefix`.
    ///
    /// Returns `None` when `old_prefix` is not a prefix of this path.
    #[must_use]
    pub fn rebase(&self, old_prefix: &Self, new_prefix: &Self) -> Option<Self> {
        if self == old_prefix {
            return Some(new_prefix.clone());
        }
        if !self.is_descendant_of(old_prefix) {
            return None;
        }
        let rest = &self.0[old_prefix.0.len()..];
        Some(Self(format!("{}{rest}", new_prefix.0)))
    }
}

fn validate_label(label: &str) -> Result<(), CategoryPathError> {
    let valid = !label.is_empty()
        && label.len() <= 256
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CategoryPathError::InvalidLabel(label.to_string()))
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CategoryPath {
    type Error = CategoryPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CategoryPath> for String {
    fn from(path: CategoryPath) -> Self {
        path.0
    }
}

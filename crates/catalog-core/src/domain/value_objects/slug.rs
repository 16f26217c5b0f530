//! URL slug value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum slug length, matching the `VARCHAR(255)` columns.
pub const MAX_SLUG_LENGTH: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug exceeds {MAX_SLUG_LENGTH} characters")]
    TooLong,
    #[error("slug '{0}' must contain lowercase letters, digits and single hyphens")]
    InvalidFormat(String),
}

/// A lowercase, hyphen-separated URL segment such as `smart-phones`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SlugError> {
        let value = value.as_ref();
        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if value.len() > MAX_SLUG_LENGTH {
            return Err(SlugError::TooLong);
        }
        let well_formed = value
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        if !well_formed {
            return Err(SlugError::InvalidFormat(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Builds a slug from free text: lowercases ASCII alphanumerics and joins
    /// every other run of characters with a single hyphen.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }
        if slug.len() > MAX_SLUG_LENGTH {
            slug.truncate(MAX_SLUG_LENGTH);
            while slug.ends_with('-') {
                slug.pop();
            }
        }
        Self::new(slug)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(Slug::new("phones").is_ok());
        assert!(Slug::new("smart-phones-2024").is_ok());
    }

    #[test]
    fn test_invalid_slugs() {
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
        assert!(Slug::new("Phones").is_err());
        assert!(Slug::new("smart--phones").is_err());
        assert!(Slug::new("-phones").is_err());
        assert!(Slug::new("phones-").is_err());
        assert_eq!(Slug::new("a".repeat(256)), Err(SlugError::TooLong));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Slug::from_name("Smart Phones & Tablets").unwrap().as_str(), "smart-phones-tablets");
        assert_eq!(Slug::from_name("  USB-C  Cable ").unwrap().as_str(), "usb-c-cable");
        assert_eq!(Slug::from_name("iPhone 15 Pro").unwrap().as_str(), "iphone-15-pro");
        assert!(Slug::from_name("!!!").is_err());
    }
}

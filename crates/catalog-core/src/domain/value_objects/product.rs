//! Product value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a product, stored as the `product_status` enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "product_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl ProductStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ProductValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            other => Err(ProductValueError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductValueError {
    #[error("SKU must be 1-100 characters without whitespace")]
    InvalidSku,
    #[error("unknown product status '{0}'")]
    UnknownStatus(String),
}

/// Stock keeping unit. Trimmed, 1..=100 characters, no inner whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ProductValueError> {
        let value = value.as_ref().trim();
        if value.is_empty() || value.chars().count() > 100 || value.chars().any(char::is_whitespace) {
            return Err(ProductValueError::InvalidSku);
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Sku {
    type Error = ProductValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self {
        sku.0
    }
}

/// Main image plus an ordered, duplicate-free gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductImages {
    pub main_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

impl ProductImages {
    /// Adds an image. A new main image demotes the previous one into the gallery.
    pub fn add_image(&mut self, url: impl Into<String>, is_main: bool) {
        let url = url.into();
        if is_main {
            self.gallery.retain(|u| u != &url);
            if let Some(previous) = self.main_image.replace(url) {
                if !self.gallery.contains(&previous) {
                    self.gallery.insert(0, previous);
                }
            }
        } else if self.main_image.as_deref() != Some(url.as_str()) && !self.gallery.contains(&url) {
            self.gallery.push(url);
        }
    }

    /// Removes an image; returns whether anything was removed.
    pub fn remove_image(&mut self, url: &str) -> bool {
        if self.main_image.as_deref() == Some(url) {
            self.main_image = if self.gallery.is_empty() {
                None
            } else {
                Some(self.gallery.remove(0))
            };
            return true;
        }
        let before = self.gallery.len();
        self.gallery.retain(|u| u != url);
        before != self.gallery.len()
    }

    /// Main image first, then the gallery.
    #[must_use]
    pub fn all(&self) -> Vec<&str> {
        self.main_image
            .iter()
            .chain(self.gallery.iter())
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.main_image.is_none() && self.gallery.is_empty()
    }
}

/// Search engine metadata shared by categories and products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SeoData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

impl SeoData {
    pub const MAX_TITLE: usize = 255;
    pub const MAX_DESCRIPTION: usize = 500;

    /// Returns the first violated length limit, if any.
    #[must_use]
    pub fn violation(&self) -> Option<String> {
        if self.title.as_ref().is_some_and(|t| t.chars().count() > Self::MAX_TITLE) {
            return Some(format!("SEO title exceeds {} characters", Self::MAX_TITLE));
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > Self::MAX_DESCRIPTION)
        {
            return Some(format!("SEO description exceeds {} characters", Self::MAX_DESCRIPTION));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_default() {
        assert_eq!(ProductStatus::default(), ProductStatus::Active);
        assert_eq!("ARCHIVED".parse::<ProductStatus>().unwrap(), ProductStatus::Archived);
        assert!("deleted".parse::<ProductStatus>().is_err());
        assert_eq!(serde_json::to_string(&ProductStatus::Inactive).unwrap(), "\"inactive\"");
    }

    #[test]
    fn test_sku() {
        assert_eq!(Sku::new("  IPH-15  ").unwrap().as_str(), "IPH-15");
        assert!(Sku::new("").is_err());
        assert!(Sku::new("A B").is_err());
        assert!(Sku::new("X".repeat(101)).is_err());
    }

    #[test]
    fn test_images_add_and_remove() {
        let mut images = ProductImages::default();
        images.add_image("a.jpg", false);
        images.add_image("a.jpg", false);
        images.add_image("main.jpg", true);
        assert_eq!(images.all(), vec!["main.jpg", "a.jpg"]);

        images.add_image("new-main.jpg", true);
        assert_eq!(images.main_image.as_deref(), Some("new-main.jpg"));
        assert_eq!(images.gallery, vec!["main.jpg", "a.jpg"]);

        assert!(images.remove_image("new-main.jpg"));
        assert_eq!(images.main_image.as_deref(), Some("main.jpg"));
        assert!(!images.remove_image("missing.jpg"));
    }

    #[test]
    fn test_seo_limits() {
        let seo = SeoData {
            title: Some("t".repeat(256)),
            ..SeoData::default()
        };
        assert!(seo.violation().is_some());
        assert!(SeoData::default().violation().is_none());
    }
}

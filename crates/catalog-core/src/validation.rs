//! Validation utilities.

use crate::{CatalogError, FieldError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `CatalogError` on failure.
    fn validate_request(&self) -> Result<(), CatalogError> {
        self.validate().map_err(validation_errors_to_catalog_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect()
}

/// Converts `validator::ValidationErrors` to `CatalogError`.
#[must_use]
pub fn validation_errors_to_catalog_error(errors: ValidationErrors) -> CatalogError {
    let message = field_errors(&errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    CatalogError::Validation(message)
}

/// Common validation functions used in `#[validate(custom(...))]` attributes.
pub mod rules {
    use crate::domain::value_objects::{Sku, Slug};
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates that a username meets requirements.
    pub fn valid_username(username: &str) -> Result<(), ValidationError> {
        if username.len() < 3 {
            return Err(ValidationError::new("username_too_short"));
        }
        if username.len() > 32 {
            return Err(ValidationError::new("username_too_long"));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::new("username_invalid_characters"));
        }
        if !username.chars().next().is_some_and(char::is_alphabetic) {
            return Err(ValidationError::new("username_must_start_with_letter"));
        }
        Ok(())
    }

    /// Validates a URL-friendly slug.
    pub fn valid_slug(slug: &str) -> Result<(), ValidationError> {
        Slug::new(slug)
            .map(|_| ())
            .map_err(|_| ValidationError::new("invalid_slug"))
    }

    /// Validates a product SKU.
    pub fn valid_sku(sku: &str) -> Result<(), ValidationError> {
        Sku::new(sku)
            .map(|_| ())
            .map_err(|_| ValidationError::new("invalid_sku"))
    }

    /// Validates an ISO 4217 style currency code.
    pub fn valid_currency(code: &str) -> Result<(), ValidationError> {
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid_currency"))
        }
    }
}

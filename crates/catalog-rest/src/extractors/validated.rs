//! JSON extractor that runs `validator` rules before the handler.

use crate::responses::{error_response, validation_failed};
use catalog_core::{field_errors, ErrorResponse, FieldError};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Deserialized and validated JSON body.
///
/// Malformed JSON is rejected with 400, failed rules with 422 and the
/// offending fields listed under `error.details`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Validation(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Json(rejection) => error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    code: "INVALID_JSON".to_string(),
                    message: format!("Invalid JSON: {rejection}"),
                    details: None,
                },
            ),
            Self::Validation(errors) => validation_failed(collect_field_errors(&errors)),
        }
    }
}

/// Flattens nested struct and list errors into dotted field paths.
fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected = field_errors(errors);

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Struct(nested) => {
                collected.extend(collect_field_errors(nested).into_iter().map(|e| FieldError {
                    field: format!("{field}.{}", e.field),
                    ..e
                }));
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collected.extend(collect_field_errors(nested).into_iter().map(|e| FieldError {
                        field: format!("{field}[{index}].{}", e.field),
                        ..e
                    }));
                }
            }
            ValidationErrorsKind::Field(_) => {}
        }
    }

    collected
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;

        value.validate().map_err(ValidatedJsonRejection::Validation)?;

        Ok(ValidatedJson(value))
    }
}

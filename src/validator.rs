//! JSON body extractor that runs `validator` rules before the handler sees the DTO.
//!
//! Body problems are 400s; rule violations are 422s listing every failing field.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use tessera_core::AppError;

/// `field: message` pairs, sorted by field so the output is stable.
fn describe_violations(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: failed `{}`", error.code),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn body_rejection(rejection: &JsonRejection) -> AppError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected `Content-Type: application/json`".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON".to_string(),
        // serde's message names the offending field without echoing values.
        JsonRejection::JsonDataError(err) => format!("Invalid request body: {}", err.body_text()),
        _ => "Invalid request body".to_string(),
    };
    AppError::new(StatusCode::BAD_REQUEST, anyhow!(message))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| body_rejection(&rejection))?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!(describe_violations(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

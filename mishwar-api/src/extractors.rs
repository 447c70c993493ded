use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use mishwar_domain::validation::{FieldIssue, ValidationErrors};

use crate::error::AppError;

/// A request body that must deserialize cleanly. Failures surface as the
/// same field-level 400 list that domain validation produces, instead of
/// axum's plain-text rejections.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// Query-string counterpart of [`JsonBody`].
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let issue = match &rejection {
            JsonRejection::JsonDataError(err) => {
                body_issue(strip_rejection_prefix(&err.body_text()))
            }
            JsonRejection::JsonSyntaxError(_) => FieldIssue {
                path: String::new(),
                message: "Request body must be valid JSON".to_string(),
            },
            JsonRejection::MissingJsonContentType(_) => FieldIssue {
                path: String::new(),
                message: "Content-Type must be application/json".to_string(),
            },
            _ => FieldIssue {
                path: String::new(),
                message: "Invalid request body".to_string(),
            },
        };
        AppError::Validation(ValidationErrors {
            issues: vec![issue],
        })
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let issue = body_issue(strip_rejection_prefix(&rejection.body_text()));
        AppError::Validation(ValidationErrors {
            issues: vec![issue],
        })
    }
}

/// Rejection bodies read "<what was being read>: <serde detail>"; only the
/// detail is useful to clients.
fn strip_rejection_prefix(text: &str) -> &str {
    text.split_once(": ").map_or(text, |(_, detail)| detail)
}

/// Maps a serde deserialization message onto the `{path, message}` issue
/// shape. serde names the offending field either in a `missing field`
/// detail or as a leading path segment.
fn body_issue(detail: &str) -> FieldIssue {
    if let Some((_, rest)) = detail.split_once("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return FieldIssue {
                path: field.to_string(),
                message: format!("{field} is required"),
            };
        }
    }
    if let Some((path, message)) = detail.split_once(": ") {
        if is_field_path(path) {
            return FieldIssue {
                path: path.to_string(),
                message: message.to_string(),
            };
        }
    }
    FieldIssue {
        path: String::new(),
        message: detail.to_string(),
    }
}

fn is_field_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

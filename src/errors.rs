use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::JsonResponse;

#[derive(Debug)]
pub enum RequestError {
    NotFound(&'static str),
    NotAuthorized(&'static str),
    Forbidden(&'static str),
    Validation(String),
    Conflict(&'static str),
    ServerError,
    DatabaseError(sqlx::Error),
}

#[derive(serde::Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: RequestErrorJson,
}

#[derive(serde::Serialize)]
pub struct RequestErrorJson {
    body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
        }
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

/// The storage layer backs every uniqueness rule (duplicate follow,
/// favorite, shopping-list entry, ingredient-in-recipe) with a UNIQUE
/// constraint, so concurrent writers surface here instead of racing past
/// the request-level checks.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound(message) => {
                (StatusCode::NOT_FOUND, RequestErrorJsonWrapper::new(message))
            }
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, RequestErrorJsonWrapper::new(message))
            }
            RequestError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Conflict(message) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }
}

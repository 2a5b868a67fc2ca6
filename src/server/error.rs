use super::types::ErrorResponse;
use crate::Error;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// An error already mapped to the status and message the client sees.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NoInput => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            // Decoder details stay in the logs.
            Error::InvalidImage(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid image data"),
            Error::ClassifierUnavailable => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ref e if e.is_upstream() => Self::new(StatusCode::BAD_GATEWAY, e.to_string()),
            e => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

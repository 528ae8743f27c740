use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::client::ApiError;
use crate::slots::SlotError;

#[derive(Debug, Error)]
pub(crate) enum WebError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl WebError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            WebError::Slot(SlotError::PlayerNotInTurn(_)) => StatusCode::NOT_FOUND,
            WebError::Slot(SlotError::InvalidSlot(_)) => StatusCode::BAD_REQUEST,
            WebError::Slot(_) => StatusCode::CONFLICT,
            WebError::Api(ApiError::NotLoggedIn | ApiError::Unauthorized) => {
                StatusCode::UNAUTHORIZED
            }
            WebError::Api(e) if e.status() == Some(StatusCode::NOT_FOUND) => StatusCode::NOT_FOUND,
            WebError::Api(_) => StatusCode::BAD_GATEWAY,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

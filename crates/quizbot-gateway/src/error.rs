use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizbot_core::QuizError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Request failure rendered as `{"error": kind, "message": text}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("{0}")]
    BadRequest(String),

    /// An extractor rejected the request body.
    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("too many requests, retry in a minute")]
    RateLimited,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Quiz(e) => match e {
                QuizError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                QuizError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                QuizError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                QuizError::EmptyInput => StatusCode::BAD_REQUEST,
                QuizError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(status, _) => *status,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Quiz(e) => e.kind(),
            Self::Rejected(status, _) if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            }
            Self::BadRequest(_) | Self::Rejected(..) => "bad_request",
            Self::RateLimited => "rate_limited",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        } else {
            tracing::debug!("request rejected ({status}): {self}");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use poll_ledger::{ErrorKind, LedgerError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Ledger outcomes clients act on get their own status; anything else
    /// is a 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(err) => match err.kind() {
                ErrorKind::AlreadyVoted => StatusCode::CONFLICT,
                ErrorKind::PollEnded => StatusCode::GONE,
                ErrorKind::InvalidTransition => StatusCode::LENGTH_REQUIRED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind_name(&self) -> String {
        match self {
            Self::Ledger(err) => err.kind().to_string(),
            Self::Config(_) => "Config".into(),
            Self::Io(_) => "Io".into(),
            Self::Internal(_) => "Internal".into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind_name(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

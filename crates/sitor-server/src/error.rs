use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sitor_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The group's session has ended.
    #[error("{0}")]
    Gone(String),

    /// A store operation failed. `message` is what the client sees.
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Store operation timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(source: StoreError) -> Self {
        ServerError::Store {
            message: "Database error",
            source,
        }
    }
}

/// Attach a client-facing message to a store failure.
pub trait StoreContext<T> {
    fn context(self, message: &'static str) -> Result<T, ServerError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, message: &'static str) -> Result<T, ServerError> {
        self.map_err(|source| ServerError::Store { message, source })
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Gone(_) => StatusCode::GONE,
            ServerError::Store { .. } | ServerError::Timeout | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Store { message, source } => {
                tracing::error!(error = %source, "{message}");
                message.to_string()
            }
            ServerError::Timeout => {
                tracing::error!("Store operation timed out");
                self.to_string()
            }
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use remix_core::RemixError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Export error: {0}")]
    Export(#[from] RemixError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Export(e) => match e {
                RemixError::UnsupportedFormat(_) | RemixError::InvalidParameter(_) => {
                    StatusCode::BAD_REQUEST
                }
                RemixError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RemixError::ExportInProgress => StatusCode::CONFLICT,
                RemixError::ReverbAsset(_)
                | RemixError::RenderFailure(_)
                | RemixError::Encode(_)
                | RemixError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::BadRequest(msg) => msg,
            ServerError::Export(ref e) if status.is_client_error() => {
                tracing::warn!("Export rejected: {}", e);
                match e {
                    // The detail names the offending field or extension
                    RemixError::InvalidParameter(msg) => msg.clone(),
                    _ => e.user_message().to_string(),
                }
            }
            ServerError::Export(ref e) => {
                tracing::error!("Export failed: {}", e);
                e.user_message().to_string()
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                "IO error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

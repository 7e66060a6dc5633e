//! Common error types and handling for Cartoonist

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Cartoonist application
///
/// The pipeline variants mirror the stage that failed, so a caller can tell a
/// language-model outage from a storage outage without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream language model error: {0}")]
    UpstreamLanguageModel(String),

    #[error("Upstream image model error: {message}")]
    UpstreamImageModel { message: String, timed_out: bool },

    #[error("Artifact retrieval error: {0}")]
    ArtifactRetrieval(String),

    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Metadata write error: {0}")]
    MetadataWrite(String),

    #[error("Metadata read error: {0}")]
    MetadataRead(String),
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamImageModel {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Error::UpstreamLanguageModel(_)
            | Error::UpstreamImageModel { .. }
            | Error::ArtifactRetrieval(_) => StatusCode::BAD_GATEWAY,
            Error::StorageWrite(_) | Error::MetadataWrite(_) | Error::MetadataRead(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::UpstreamLanguageModel(_) => "UPSTREAM_LANGUAGE_MODEL_ERROR",
            Error::UpstreamImageModel { .. } => "UPSTREAM_IMAGE_MODEL_ERROR",
            Error::ArtifactRetrieval(_) => "ARTIFACT_RETRIEVAL_ERROR",
            Error::StorageWrite(_) => "STORAGE_WRITE_ERROR",
            Error::MetadataWrite(_) => "METADATA_WRITE_ERROR",
            Error::MetadataRead(_) => "METADATA_READ_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = error_code, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

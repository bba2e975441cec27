use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::normalizer::NormalizationError;
use crate::llm_client::registry::ConfigurationError;
use crate::llm_client::LlmError;
use crate::retrieval::store::StoreError;

/// Boundary-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every pipeline failure surfaces as status `INTERNAL` carrying the
/// originating message; credentials never appear in any variant's message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("LLM error: {0}")]
    Provider(#[from] LlmError),

    #[error("Failed to parse AI response: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Chunk store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid argument: {0}")]
    Validation(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "INVALID_ARGUMENT",
            _ => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Provider;

    #[test]
    fn test_configuration_error_maps_to_internal() {
        let err: AppError = ConfigurationError::MissingCredential {
            provider: Provider::Gemini,
            var: "GEMINI_API_KEY",
        }
        .into();
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("GEMINI_API_KEY not found"));
    }

    #[test]
    fn test_provider_error_keeps_originating_message() {
        let err: AppError = LlmError::Api {
            status: 401,
            message: "invalid x-api-key".to_string(),
        }
        .into();
        assert_eq!(err.code(), "INTERNAL");
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err = AppError::Validation("owner_id cannot be empty".to_string());
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_response_status_matches_error_kind() {
        let response = AppError::Normalization(NormalizationError::Empty).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_maps_to_internal() {
        let err: AppError = StoreError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(err.code(), "INTERNAL");
        assert!(err.to_string().starts_with("Chunk store error:"));
    }
}

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::qsf::SurveyError;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid study specification: {0}")]
    InvalidSpec(String),

    #[error("Unsupported demographic type: {0}")]
    UnsupportedDemographicType(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Remote API error: {0}")]
    RemoteApiError(String),

    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidSpec(_) => "INVALID_SPEC",
            AppError::UnsupportedDemographicType(_) => "UNSUPPORTED_DEMOGRAPHIC_TYPE",
            AppError::ExtractionError(_) => "EXTRACTION_ERROR",
            AppError::RemoteApiError(_) => "REMOTE_API_ERROR",
            AppError::RemoteUnavailable(_) => "REMOTE_UNAVAILABLE",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same remote call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::RemoteUnavailable(_))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidSpec(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedDemographicType(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExtractionError(_) => StatusCode::BAD_GATEWAY,
            AppError::RemoteApiError(_) => StatusCode::BAD_GATEWAY,
            AppError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.status_code().as_u16(),
        })
    }
}

impl From<SurveyError> for AppError {
    fn from(err: SurveyError) -> Self {
        match err {
            SurveyError::InvalidSpec(reason) => AppError::InvalidSpec(reason),
            err @ SurveyError::UnsupportedDemographicType { .. } => {
                AppError::UnsupportedDemographicType(err.to_string())
            }
        }
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let transient = err.is_timeout()
            || err.is_connect()
            || err
                .status()
                .is_some_and(|s| s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS);
        if transient {
            AppError::RemoteUnavailable(err.to_string())
        } else {
            AppError::RemoteApiError(err.to_string())
        }
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON serialization error: {}", err))
    }
}
impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::ExtractionError(format!("Language model request failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

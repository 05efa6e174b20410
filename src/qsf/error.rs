use thiserror::Error;

/// Failures that stop a survey document from being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("Invalid study specification: {0}")]
    InvalidSpec(String),

    #[error("Unsupported demographic type '{kind}' for field '{field}'")]
    UnsupportedDemographicType { field: String, kind: String },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

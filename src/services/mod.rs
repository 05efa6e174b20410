pub mod hypothesis_extractor;
pub mod llm_service;
pub mod replay_steps;
pub mod scale_extractor;
pub mod survey_platform;
pub mod survey_service;

pub use hypothesis_extractor::HypothesisExtractor;
pub use llm_service::{LanguageModel, OpenAiModel};
pub use scale_extractor::{
    DocumentTextExtractor, PdfTextExtractor, PlainTextExtractor, ScaleExtractor,
};
pub use survey_platform::{QualtricsClient, SurveyPlatform};
pub use survey_service::{ReplayReport, SurveyPreview, SurveyService};

use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        DocumentTextExtractor, HypothesisExtractor, LanguageModel, OpenAiModel, PdfTextExtractor,
        QualtricsClient, ScaleExtractor, SurveyPlatform, SurveyService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub survey_service: Arc<SurveyService>,
    pub hypothesis_extractor: Arc<HypothesisExtractor>,
    pub scale_extractor: ScaleExtractor,
    pub document_reader: Arc<dyn DocumentTextExtractor>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let model = Arc::new(OpenAiModel::new(&config.openai_api_key, &config.openai_model));
        let platform = Arc::new(QualtricsClient::new(
            config.qualtrics_api_token.clone(),
            config.qualtrics_datacenter.clone(),
        ));
        Self::with_services(config, model, platform)
    }

    /// Wires the services around the given remote collaborators.
    pub fn with_services(
        config: Config,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn SurveyPlatform>,
    ) -> Self {
        Self {
            survey_service: Arc::new(SurveyService::from_config(&config, platform)),
            hypothesis_extractor: Arc::new(HypothesisExtractor::new(model)),
            scale_extractor: ScaleExtractor,
            document_reader: Arc::new(PdfTextExtractor::default()),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_uses_configured_retries() {
        let state = AppState::new(Config::test_config());
        assert_eq!(state.survey_service.steps()[1].max_retries, 2);
    }
}

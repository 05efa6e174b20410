use serde::Serialize;

use crate::{
    models::domain::{ExtractedScale, HypothesisExtraction},
    services::{ReplayReport, SurveyPreview},
};

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub preview: SurveyPreview,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyResponse {
    pub success: bool,
    pub survey_id: String,
    pub survey_url: String,
    pub message: String,
    pub report: ReplayReport,
}

impl From<ReplayReport> for CreateSurveyResponse {
    fn from(report: ReplayReport) -> Self {
        let message = if report.blocks_failed + report.questions_failed == 0 && report.flow_updated
        {
            "Survey created successfully in Qualtrics".to_string()
        } else {
            format!(
                "Survey created with {} failed blocks and {} failed questions{}",
                report.blocks_failed,
                report.questions_failed,
                if report.flow_updated { "" } else { "; survey flow was not applied" }
            )
        };
        Self {
            success: true,
            survey_id: report.survey_id.clone(),
            survey_url: report.survey_url.clone(),
            message,
            report,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub total_hypotheses: usize,
    pub parsed_hypotheses: usize,
    #[serde(rename = "uniqueDVs")]
    pub unique_dvs: usize,
    #[serde(rename = "uniqueIVs")]
    pub unique_ivs: usize,
}

#[derive(Debug, Serialize)]
pub struct ExtractDvsResponse {
    pub success: bool,
    pub extraction: HypothesisExtraction,
    pub summary: ExtractionSummary,
}

impl From<HypothesisExtraction> for ExtractDvsResponse {
    fn from(extraction: HypothesisExtraction) -> Self {
        let summary = ExtractionSummary {
            total_hypotheses: extraction.hypotheses.len(),
            parsed_hypotheses: extraction.parsed_count(),
            unique_dvs: extraction.unique_dvs.len(),
            unique_ivs: extraction.unique_ivs.len(),
        };
        Self {
            success: true,
            extraction,
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseScalesResponse {
    pub success: bool,
    pub scales: Vec<ExtractedScale>,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SuggestScalesResponse {
    pub success: bool,
    pub dv: String,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::extraction::ParsedHypothesis;

    #[test]
    fn test_extraction_summary_counts_parsed_hypotheses() {
        let extraction = HypothesisExtraction {
            hypotheses: vec![
                ParsedHypothesis {
                    id: "h_1".into(),
                    original: "A -> B".into(),
                    iv: Some("A".into()),
                    dv: Some("B".into()),
                    relationship: "affects".into(),
                    parsed: true,
                },
                ParsedHypothesis {
                    id: "h_2".into(),
                    original: "?".into(),
                    iv: None,
                    dv: None,
                    relationship: "affects".into(),
                    parsed: false,
                },
            ],
            ..HypothesisExtraction::default()
        };

        let response = ExtractDvsResponse::from(extraction);
        assert_eq!(response.summary.total_hypotheses, 2);
        assert_eq!(response.summary.parsed_hypotheses, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["summary"]["uniqueDVs"], 0);
        assert_eq!(json["summary"]["parsedHypotheses"], 1);
    }

    #[test]
    fn test_partial_replay_is_described() {
        let report = ReplayReport {
            survey_id: "SV_1".into(),
            survey_url: "https://yul1.qualtrics.com/jfe/form/SV_1".into(),
            blocks_created: 3,
            blocks_failed: 1,
            questions_created: 4,
            questions_failed: 0,
            flow_updated: true,
        };

        let response = CreateSurveyResponse::from(report);
        assert!(response.message.contains("1 failed blocks"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["surveyId"], "SV_1");
        assert_eq!(json["report"]["blocksFailed"], 1);
    }
}

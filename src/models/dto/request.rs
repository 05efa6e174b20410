use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::models::domain::study::{
    DemographicConfig, DemographicSelection, DependentVariable, ExperimentalDesign, ExportSettings,
    Hypothesis, IncludeTemplates, RandomizationPolicy, StudySpec,
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDataRequest {
    #[validate(nested)]
    #[serde(deserialize_with = "study_from_payload")]
    pub survey_data: StudySpec,
}

fn study_from_payload<'de, D>(deserializer: D) -> Result<StudySpec, D::Error>
where
    D: Deserializer<'de>,
{
    StudyPayload::deserialize(deserializer).map(StudySpec::from)
}

/// Study as posted by the survey builder. Accepts both the flat layout and the builder's
/// export layout, where the title sits under `study`, demographics are field names and
/// their settings live in `exportSettings.demographicOptions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPayload {
    #[serde(default)]
    pub study: Option<StudyHeader>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hypotheses: HypothesesPayload,
    #[serde(default)]
    pub dependent_variables: Vec<DependentVariable>,
    #[serde(default)]
    pub demographics: Vec<DemographicEntry>,
    #[serde(default)]
    pub design: Option<ExperimentalDesign>,
    #[serde(default)]
    pub randomization: RandomizationPolicy,
    #[serde(default)]
    pub export_settings: ExportSettingsPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyHeader {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The builder sends its hypothesis textarea as one string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HypothesesPayload {
    Single(String),
    Many(Vec<Hypothesis>),
}

impl Default for HypothesesPayload {
    fn default() -> Self {
        HypothesesPayload::Many(Vec::new())
    }
}

impl From<HypothesesPayload> for Vec<Hypothesis> {
    fn from(payload: HypothesesPayload) -> Self {
        match payload {
            HypothesesPayload::Single(statement) if statement.trim().is_empty() => Vec::new(),
            HypothesesPayload::Single(statement) => vec![Hypothesis {
                statement,
                ..Hypothesis::default()
            }],
            HypothesesPayload::Many(hypotheses) => hypotheses,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DemographicEntry {
    Selection(DemographicSelection),
    Field(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettingsPayload {
    #[serde(default)]
    pub include_templates: IncludeTemplates,
    #[serde(default)]
    pub demographic_options: BTreeMap<String, DemographicConfig>,
}

/// Resolves demographic entries in request order. Bare field names take their settings from
/// `options` (matched case-insensitively); names without settings are dropped. Settings for
/// fields never named in the list are appended afterwards.
fn resolve_demographics(
    entries: Vec<DemographicEntry>,
    mut options: BTreeMap<String, DemographicConfig>,
) -> Vec<DemographicSelection> {
    let mut selections = Vec::with_capacity(entries.len() + options.len());

    for entry in entries {
        match entry {
            DemographicEntry::Selection(selection) => {
                options.remove(&selection.field.to_lowercase());
                selections.push(selection);
            }
            DemographicEntry::Field(field) => {
                let key = field.trim().to_lowercase();
                match options.remove(&key) {
                    Some(config) => selections.push(DemographicSelection::with_config(&key, config)),
                    None => log::debug!("No settings given for demographic '{}', skipping", field),
                }
            }
        }
    }

    selections.extend(
        options
            .into_iter()
            .map(|(field, config)| DemographicSelection::with_config(&field, config)),
    );
    selections
}

impl From<StudyPayload> for StudySpec {
    fn from(payload: StudyPayload) -> Self {
        let header = payload.study.unwrap_or_default();
        let options = payload
            .export_settings
            .demographic_options
            .into_iter()
            .map(|(field, config)| (field.trim().to_lowercase(), config))
            .collect();

        StudySpec {
            title: header.title.or(payload.title),
            description: header.description.or(payload.description),
            hypotheses: payload.hypotheses.into(),
            dependent_variables: payload.dependent_variables,
            demographics: resolve_demographics(payload.demographics, options),
            design: payload.design,
            randomization: payload.randomization,
            export_settings: ExportSettings {
                include_templates: payload.export_settings.include_templates,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExtractDvsRequest {
    #[validate(length(min = 1, max = 50, message = "Provide between 1 and 50 hypotheses"))]
    pub hypotheses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_data_request_validates_nested_study() {
        let body = serde_json::json!({
            "surveyData": {
                "title": "t".repeat(501),
            }
        });
        let request: SurveyDataRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_survey_data_request_accepts_minimal_study() {
        let body = serde_json::json!({ "surveyData": { "title": "Sleep" } });
        let request: SurveyDataRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.survey_data.survey_title(), "Sleep");
    }

    #[test]
    fn test_survey_data_request_reads_builder_export_layout() {
        let body = serde_json::json!({
            "surveyData": {
                "study": { "title": "Does sleep affect mood?", "description": "Does sleep affect mood?" },
                "hypotheses": ["Sleep improves mood"],
                "dependentVariables": [{
                    "id": 1717000000000u64,
                    "name": "Mood",
                    "operationalizations": [{
                        "id": "op_1",
                        "scaleName": "Mood Scale",
                        "method": "pdf",
                        "items": [{ "id": "item_1", "text": "I feel cheerful", "responseType": "likert7" }]
                    }]
                }],
                "demographics": ["Age", "Location", "Hobby"],
                "exportSettings": {
                    "format": "qsf",
                    "includeTemplates": { "consent": true, "demographics": true, "debrief": true },
                    "demographicOptions": {
                        "age": { "type": "numeric", "validation": { "min": 18, "max": 100 } },
                        "location": { "type": "text", "placeholder": "City, State/Country" }
                    }
                },
                "randomization": {
                    "betweenBlocks": { "enabled": true, "type": "full", "fixedBlocks": ["consent"] },
                    "withinBlocks": { "enabled": true, "blockSettings": {} }
                }
            }
        });

        let request: SurveyDataRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_ok());

        let study = request.survey_data;
        assert_eq!(study.survey_title(), "Does sleep affect mood?");
        assert_eq!(study.hypotheses[0].statement, "Sleep improves mood");
        assert_eq!(study.dependent_variables[0].block_key(), "dv_1717000000000");
        let fields: Vec<_> = study.demographics.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["age", "location"]);
        assert_eq!(study.demographics[1].config.kind, "text");
        assert!(study.randomization.shuffles_block_order());
    }

    #[test]
    fn test_single_hypothesis_string_becomes_one_entry() {
        let body = serde_json::json!({ "surveyData": { "title": "t", "hypotheses": "Exercise -> mood" } });
        let request: SurveyDataRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.survey_data.hypotheses.len(), 1);

        let body = serde_json::json!({ "surveyData": { "title": "t", "hypotheses": "  " } });
        let request: SurveyDataRequest = serde_json::from_value(body).unwrap();
        assert!(request.survey_data.hypotheses.is_empty());
    }

    #[test]
    fn test_full_demographic_entries_take_precedence_over_options() {
        let study = StudySpec::from(StudyPayload {
            demographics: vec![
                DemographicEntry::Selection(DemographicSelection::multiple_choice("gender", &["A", "B"])),
                DemographicEntry::Field("Age".into()),
            ],
            export_settings: ExportSettingsPayload {
                include_templates: IncludeTemplates::default(),
                demographic_options: BTreeMap::from([
                    ("age".to_string(), DemographicSelection::numeric("age", None, None).config),
                    ("gender".to_string(), DemographicSelection::multiple_choice("gender", &["X"]).config),
                    ("education".to_string(), DemographicSelection::multiple_choice("education", &["BA"]).config),
                ]),
            },
            ..StudyPayload::default()
        });

        let fields: Vec<_> = study.demographics.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["gender", "age", "education"]);
        assert_eq!(study.demographics[0].config.options, ["A", "B"]);
    }

    #[test]
    fn test_extract_dvs_request_requires_hypotheses() {
        let request = ExtractDvsRequest { hypotheses: vec![] };
        assert!(request.validate().is_err());

        let request = ExtractDvsRequest {
            hypotheses: vec!["Exercise -> mood".into()],
        };
        assert!(request.validate().is_ok());
    }
}

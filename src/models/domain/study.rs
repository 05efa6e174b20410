use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Title used when the study arrives without one.
pub const DEFAULT_SURVEY_TITLE: &str = "Research Survey";

/// Root input for one generation request. Immutable during assembly.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudySpec {
    #[validate(length(max = 500))]
    #[serde(default)]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,

    #[validate(nested)]
    #[serde(default)]
    pub dependent_variables: Vec<DependentVariable>,

    #[serde(default)]
    pub demographics: Vec<DemographicSelection>,

    #[validate(nested)]
    #[serde(default)]
    pub design: Option<ExperimentalDesign>,

    #[serde(default)]
    pub randomization: RandomizationPolicy,

    #[serde(default)]
    pub export_settings: ExportSettings,
}

impl StudySpec {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// Title with blank values treated as absent.
    pub fn title_text(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn description_text(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn survey_title(&self) -> &str {
        self.title_text().unwrap_or(DEFAULT_SURVEY_TITLE)
    }

    pub fn is_experimental(&self) -> bool {
        self.design.as_ref().is_some_and(ExperimentalDesign::is_experimental)
    }

    /// Condition labels of an experimental design; empty for every other design.
    pub fn conditions(&self) -> &[String] {
        match &self.design {
            Some(design) if design.is_experimental() => &design.conditions,
            _ => &[],
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A hypothesis arrives either as a bare statement or with its variables spelled out.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "HypothesisInput")]
pub struct Hypothesis {
    pub statement: String,
    #[serde(default)]
    pub independent_variable: Option<String>,
    #[serde(default)]
    pub dependent_variable: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HypothesisInput {
    Statement(String),
    Detailed(HypothesisFields),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HypothesisFields {
    #[serde(alias = "text")]
    statement: String,
    #[serde(default)]
    independent_variable: Option<String>,
    #[serde(default)]
    dependent_variable: Option<String>,
    #[serde(default)]
    relationship: Option<String>,
}

impl From<HypothesisInput> for Hypothesis {
    fn from(input: HypothesisInput) -> Self {
        match input {
            HypothesisInput::Statement(statement) => Hypothesis {
                statement,
                ..Hypothesis::default()
            },
            HypothesisInput::Detailed(fields) => Hypothesis {
                statement: fields.statement,
                independent_variable: fields.independent_variable,
                dependent_variable: fields.dependent_variable,
                relationship: fields.relationship,
            },
        }
    }
}

/// Variable ids arrive as strings or as client-side numeric timestamps.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DependentVariable {
    #[validate(length(min = 1, max = 100))]
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[validate(nested)]
    #[serde(default)]
    pub operationalizations: Vec<Operationalization>,
}

impl DependentVariable {
    /// Operationalizations that carry at least one item, in declaration order.
    pub fn measured(&self) -> impl Iterator<Item = &Operationalization> {
        self.operationalizations.iter().filter(|op| !op.items.is_empty())
    }

    pub fn is_measurable(&self) -> bool {
        self.measured().next().is_some()
    }

    /// Key of this variable's measurement block, also used for per-block randomization settings.
    pub fn block_key(&self) -> String {
        format!("dv_{}", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Operationalization {
    pub scale_name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub source: MeasureSource,
    #[validate(nested)]
    #[serde(default)]
    pub scale: Option<ResponseScale>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureSource {
    #[default]
    FreeText,
    ExtractedDocument,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
}

impl Item {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            response_type: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ResponseType {
    #[serde(rename = "likert7")]
    Likert,
    #[serde(rename = "frequency7")]
    Frequency,
    #[serde(rename = "likelihood7")]
    Likelihood,
    #[serde(rename = "yesno")]
    YesNo,
}

/// Custom answer scale for a matrix question.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Validate)]
pub struct ResponseScale {
    #[validate(range(min = 2, max = 11))]
    pub points: u8,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DemographicSelection {
    pub field: String,
    #[serde(flatten)]
    pub config: DemographicConfig,
}

/// Raw demographic configuration. `kind` is checked when the question is built so that an
/// unknown type surfaces as its own error rather than as a parse failure.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DemographicConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<NumericBounds>,
}

impl DemographicSelection {
    pub fn numeric(field: &str, min: Option<i64>, max: Option<i64>) -> Self {
        Self::with_config(
            field,
            DemographicConfig {
                kind: "numeric".to_string(),
                options: Vec::new(),
                validation: Some(NumericBounds { min, max }),
            },
        )
    }

    pub fn multiple_choice(field: &str, options: &[&str]) -> Self {
        Self::with_config(
            field,
            DemographicConfig {
                kind: "multiple_choice".to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
                validation: None,
            },
        )
    }

    pub fn with_config(field: &str, config: DemographicConfig) -> Self {
        Self {
            field: field.to_string(),
            config,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NumericBounds {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalDesign {
    #[serde(rename = "type")]
    pub kind: DesignType,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub manipulation_check: Option<String>, // prompt override for the manipulation-check question
}

impl ExperimentalDesign {
    pub fn experimental(conditions: &[&str]) -> Self {
        Self {
            kind: DesignType::Experimental,
            conditions: conditions.iter().map(|c| c.to_string()).collect(),
            manipulation_check: None,
        }
    }

    pub fn is_experimental(&self) -> bool {
        self.kind == DesignType::Experimental
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignType {
    Experimental,
    Correlational,
    Descriptive,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationPolicy {
    #[serde(default)]
    pub between_blocks: BetweenBlocks,
    #[serde(default)]
    pub within_blocks: WithinBlocks,
}

impl RandomizationPolicy {
    /// Whether the question order inside this variable's block is shuffled per respondent.
    pub fn shuffles_questions_of(&self, dv: &DependentVariable) -> bool {
        self.within_blocks.enabled
            && self
                .within_blocks
                .block_settings
                .get(&dv.block_key())
                .is_some_and(|s| s.randomize_questions)
    }

    pub fn shuffles_block_order(&self) -> bool {
        self.between_blocks.enabled
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BetweenBlocks {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithinBlocks {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub block_settings: BTreeMap<String, BlockRandomization>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRandomization {
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_options: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub include_templates: IncludeTemplates,
}

/// Which fixed sections to include. Every section defaults to included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IncludeTemplates {
    #[serde(default = "included")]
    pub consent: bool,
    #[serde(default = "included")]
    pub demographics: bool,
    #[serde(default = "included")]
    pub debrief: bool,
}

impl Default for IncludeTemplates {
    fn default() -> Self {
        Self {
            consent: true,
            demographics: true,
            debrief: true,
        }
    }
}

fn included() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_spec_parses_camel_case_request_body() {
        let body = serde_json::json!({
            "title": "Social media and anxiety",
            "dependentVariables": [{
                "id": "1",
                "name": "Anxiety",
                "operationalizations": [{
                    "scaleName": "GAD-7",
                    "items": [{ "text": "Feeling nervous", "responseType": "frequency7" }]
                }]
            }],
            "demographics": [
                { "field": "age", "type": "numeric", "validation": { "min": 18, "max": 100 } },
                { "field": "gender", "type": "multiple_choice", "options": ["Male", "Female"] }
            ],
            "design": { "type": "experimental", "conditions": ["A", "B"] },
            "randomization": {
                "betweenBlocks": { "enabled": true },
                "withinBlocks": { "enabled": true, "blockSettings": { "dv_1": { "randomizeQuestions": true } } }
            },
            "exportSettings": { "includeTemplates": { "consent": true, "debrief": false } }
        });

        let spec: StudySpec = serde_json::from_value(body).expect("spec should parse");

        assert_eq!(spec.survey_title(), "Social media and anxiety");
        assert_eq!(spec.demographics[0].config.kind, "numeric");
        assert_eq!(
            spec.demographics[0].config.validation,
            Some(NumericBounds { min: Some(18), max: Some(100) })
        );
        assert_eq!(spec.conditions(), ["A", "B"]);
        assert!(spec.randomization.shuffles_questions_of(&spec.dependent_variables[0]));
        assert_eq!(
            spec.dependent_variables[0].operationalizations[0].items[0].response_type,
            Some(ResponseType::Frequency)
        );
        // omitted template flags default to included
        assert!(spec.export_settings.include_templates.demographics);
        assert!(!spec.export_settings.include_templates.debrief);
    }

    #[test]
    fn test_blank_title_falls_back_to_default() {
        let spec = StudySpec::titled("   ");
        assert_eq!(spec.title_text(), None);
        assert_eq!(spec.survey_title(), DEFAULT_SURVEY_TITLE);
    }

    #[test]
    fn test_conditions_are_ignored_for_non_experimental_designs() {
        let spec = StudySpec {
            design: Some(ExperimentalDesign {
                kind: DesignType::Correlational,
                conditions: vec!["A".into(), "B".into()],
                manipulation_check: None,
            }),
            ..StudySpec::default()
        };
        assert!(!spec.is_experimental());
        assert!(spec.conditions().is_empty());
    }

    #[test]
    fn test_unknown_design_type_parses_as_other() {
        let design: ExperimentalDesign =
            serde_json::from_value(serde_json::json!({ "type": "longitudinal" })).unwrap();
        assert_eq!(design.kind, DesignType::Other);
    }

    #[test]
    fn test_variable_without_items_is_not_measurable() {
        let dv = DependentVariable {
            id: "7".into(),
            name: "Mood".into(),
            operationalizations: vec![Operationalization {
                scale_name: "Empty".into(),
                items: vec![],
                source: MeasureSource::FreeText,
                scale: None,
            }],
        };
        assert!(!dv.is_measurable());
        assert_eq!(dv.block_key(), "dv_7");
    }

    #[test]
    fn test_within_block_shuffle_needs_global_switch() {
        let dv = DependentVariable {
            id: "1".into(),
            name: "Mood".into(),
            operationalizations: vec![],
        };
        let mut policy = RandomizationPolicy::default();
        policy.within_blocks.block_settings.insert(
            "dv_1".into(),
            BlockRandomization {
                randomize_questions: true,
                randomize_options: false,
            },
        );
        assert!(!policy.shuffles_questions_of(&dv));
        policy.within_blocks.enabled = true;
        assert!(policy.shuffles_questions_of(&dv));
    }

    #[test]
    fn test_hypothesis_accepts_bare_statement_or_fields() {
        let hypotheses: Vec<Hypothesis> = serde_json::from_value(serde_json::json!([
            "Exercise reduces anxiety",
            { "text": "Sleep improves mood" },
            { "statement": "Diet affects focus", "dependentVariable": "focus" }
        ]))
        .unwrap();

        assert_eq!(hypotheses[0].statement, "Exercise reduces anxiety");
        assert_eq!(hypotheses[0].dependent_variable, None);
        assert_eq!(hypotheses[1].statement, "Sleep improves mood");
        assert_eq!(hypotheses[2].dependent_variable.as_deref(), Some("focus"));
    }

    #[test]
    fn test_numeric_variable_id_is_read_as_text() {
        let dv: DependentVariable = serde_json::from_value(serde_json::json!({
            "id": 1717171717171u64,
            "name": "Anxiety",
            "operationalizations": []
        }))
        .unwrap();
        assert_eq!(dv.id, "1717171717171");
        assert_eq!(dv.block_key(), "dv_1717171717171");
    }
}

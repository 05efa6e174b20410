use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::study::{Item, MeasureSource, Operationalization, ResponseType};

/// Variables pulled out of a set of hypothesis statements.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisExtraction {
    pub hypotheses: Vec<ParsedHypothesis>,
    #[serde(rename = "uniqueDVs")]
    pub unique_dvs: Vec<ExtractedDependentVariable>,
    #[serde(rename = "uniqueIVs")]
    pub unique_ivs: Vec<ExtractedIndependentVariable>,
}

impl HypothesisExtraction {
    pub fn parsed_count(&self) -> usize {
        self.hypotheses.iter().filter(|h| h.parsed).count()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedHypothesis {
    pub id: String,
    pub original: String,
    pub iv: Option<String>,
    pub dv: Option<String>,
    pub relationship: String,
    pub parsed: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDependentVariable {
    pub id: String,
    pub name: String,
    pub hypothesis_indices: Vec<usize>,
    pub suggested_measures: Vec<String>,
    pub operationalizations: Vec<Operationalization>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIndependentVariable {
    pub id: String,
    pub name: String,
    pub hypothesis_indices: Vec<usize>,
    pub suggested_levels: Vec<String>,
}

/// Reply shape requested from the language model. Every field may be missing.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelExtraction {
    #[serde(default)]
    pub hypotheses: Vec<ModelHypothesis>,
    #[serde(default, rename = "uniqueDVs")]
    pub unique_dvs: Vec<ModelDependentVariable>,
    #[serde(default, rename = "uniqueIVs")]
    pub unique_ivs: Vec<ModelIndependentVariable>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelHypothesis {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub iv: Option<String>,
    #[serde(default)]
    pub dv: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    /// Treated as `true` when absent.
    #[serde(default)]
    pub parsed: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelDependentVariable {
    pub name: String,
    #[serde(default)]
    pub hypothesis_indices: Vec<usize>,
    #[serde(default)]
    pub suggested_measures: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelIndependentVariable {
    pub name: String,
    #[serde(default)]
    pub hypothesis_indices: Vec<usize>,
    #[serde(default)]
    pub suggested_levels: Vec<String>,
}

/// A scale found in document text.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedScale {
    pub scale_name: String,
    pub items: Vec<ExtractedItem>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    pub id: String,
    pub text: String,
    pub response_type: ResponseType,
}

impl From<ExtractedScale> for Operationalization {
    fn from(scale: ExtractedScale) -> Self {
        Operationalization {
            scale_name: scale.scale_name,
            items: scale
                .items
                .into_iter()
                .map(|item| Item {
                    text: item.text,
                    response_type: Some(item.response_type),
                })
                .collect(),
            source: MeasureSource::ExtractedDocument,
            scale: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_serializes_with_acronym_keys() {
        let extraction = HypothesisExtraction::default();
        let value = serde_json::to_value(&extraction).unwrap();
        assert!(value.get("uniqueDVs").is_some());
        assert!(value.get("uniqueIVs").is_some());
    }

    #[test]
    fn test_model_reply_tolerates_missing_fields() {
        let reply: ModelExtraction =
            serde_json::from_str(r#"{ "hypotheses": [{ "original": "A -> B" }] }"#).unwrap();
        assert_eq!(reply.hypotheses.len(), 1);
        assert_eq!(reply.hypotheses[0].parsed, None);
        assert!(reply.unique_dvs.is_empty());
    }

    #[test]
    fn test_extracted_scale_becomes_document_operationalization() {
        let scale = ExtractedScale {
            scale_name: "PSS".into(),
            items: vec![ExtractedItem {
                id: "item_1".into(),
                text: "How often have you felt upset?".into(),
                response_type: ResponseType::Frequency,
            }],
        };
        let op = Operationalization::from(scale);
        assert_eq!(op.source, MeasureSource::ExtractedDocument);
        assert_eq!(op.items[0].response_type, Some(ResponseType::Frequency));
    }
}

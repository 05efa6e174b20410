//! QSF wire encoding of a [`SurveyDocument`].
//!
//! The payload structs are public because the remote replay sends the same block, question
//! and flow payloads that a `.qsf` file carries.

use serde::{ser::SerializeMap, Serialize, Serializer};

use super::{
    model::{
        Block, BlockNode, EmbeddedDataSet, EmbeddedField, FieldSource, FlowNode, FlowRoot,
        Presentation, Question, QuestionKind, SurveyDocument, SurveyElement, SurveyMetadata,
        SurveyOptions, SurveyProtection,
    },
};

const UNSET_DATE: &str = "0000-00-00 00:00:00";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Labels keyed `"1"`, `"2"`, ... in order, each wrapped as `{ "Display": label }`.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberedLabels(pub Vec<String>);

impl NumberedLabels {
    fn order(&self) -> Vec<String> {
        (1..=self.0.len()).map(|i| i.to_string()).collect()
    }
}

impl Serialize for NumberedLabels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Display<'a> {
            #[serde(rename = "Display")]
            display: &'a str,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, label) in self.0.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), &Display { display: label })?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QsfFile {
    survey_entry: SurveyEntry,
    survey_elements: Vec<WireElement>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SurveyEntry {
    #[serde(rename = "SurveyID")]
    survey_id: String,
    survey_name: String,
    survey_description: Option<String>,
    #[serde(rename = "SurveyOwnerID")]
    survey_owner_id: String,
    #[serde(rename = "SurveyBrandID")]
    survey_brand_id: &'static str,
    #[serde(rename = "DivisionID")]
    division_id: Option<String>,
    survey_language: String,
    survey_active_response_set: String,
    survey_status: &'static str,
    survey_start_date: &'static str,
    survey_expiration_date: &'static str,
    survey_creation_date: String,
    #[serde(rename = "CreatorID")]
    creator_id: String,
    last_modified: String,
    last_accessed: &'static str,
    last_activated: &'static str,
    deleted: Option<String>,
}

impl SurveyEntry {
    fn new(survey_id: &str, metadata: &SurveyMetadata) -> Self {
        let created = metadata.created_at.format(DATE_FORMAT).to_string();
        Self {
            survey_id: survey_id.to_string(),
            survey_name: metadata.name.clone(),
            survey_description: metadata.description.clone(),
            survey_owner_id: metadata.owner_id.clone(),
            survey_brand_id: "qualtrics",
            division_id: None,
            survey_language: metadata.language.clone(),
            survey_active_response_set: metadata.response_set_id.clone(),
            survey_status: "Inactive",
            survey_start_date: UNSET_DATE,
            survey_expiration_date: UNSET_DATE,
            survey_creation_date: created.clone(),
            creator_id: metadata.creator_id.clone(),
            last_modified: created,
            last_accessed: UNSET_DATE,
            last_activated: UNSET_DATE,
            deleted: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireElement {
    #[serde(rename = "SurveyID")]
    survey_id: String,
    element: &'static str,
    primary_attribute: String,
    secondary_attribute: Option<String>,
    tertiary_attribute: Option<String>,
    payload: WirePayload,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
enum WirePayload {
    Block(BlockPayload),
    Flow(FlowPayload),
    Question(QuestionPayload),
    EmbeddedData(Vec<EmbeddedFieldPayload>),
    Options(OptionsPayload),
}

fn wire_element(survey_id: &str, element: &SurveyElement) -> WireElement {
    let (code, primary, secondary, payload) = match element {
        SurveyElement::Block(block) => (
            "BL",
            block.id.clone(),
            None,
            WirePayload::Block(block_payload(block)),
        ),
        SurveyElement::Flow(flow) => (
            "FL",
            "Survey Flow".to_string(),
            None,
            WirePayload::Flow(flow_payload(flow)),
        ),
        SurveyElement::Question(question) => (
            "SQ",
            question.id.clone(),
            Some(question.label.clone()),
            WirePayload::Question(question_payload(question)),
        ),
        SurveyElement::EmbeddedData(fields) => (
            "ED",
            "Flow".to_string(),
            None,
            WirePayload::EmbeddedData(fields.iter().map(EmbeddedFieldPayload::from).collect()),
        ),
        SurveyElement::Options(options) => (
            "SO",
            "Survey Options".to_string(),
            None,
            WirePayload::Options(OptionsPayload::from(options)),
        ),
    };
    WireElement {
        survey_id: survey_id.to_string(),
        element: code,
        primary_attribute: primary,
        secondary_attribute: secondary,
        tertiary_attribute: None,
        payload,
    }
}

impl Serialize for SurveyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        QsfFile {
            survey_entry: SurveyEntry::new(&self.survey_id, &self.metadata),
            survey_elements: self
                .elements
                .iter()
                .map(|element| wire_element(&self.survey_id, element))
                .collect(),
        }
        .serialize(serializer)
    }
}

/// Pretty-printed `.qsf` file contents.
pub fn to_qsf_json(document: &SurveyDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

// Blocks

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockPayload {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub description: String,
    #[serde(rename = "ID")]
    pub key: String,
    pub block_elements: Vec<BlockElement>,
    pub options: BlockOptions,
}

impl BlockPayload {
    /// The remote API creates blocks empty and fills them question by question.
    pub fn without_elements(mut self) -> Self {
        self.block_elements.clear();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockElement {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "QuestionID")]
    pub question_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockOptions {
    pub block_locking: &'static str,
    pub randomize_questions: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<String>,
    pub block_visibility: &'static str,
}

pub fn block_payload(block: &Block) -> BlockPayload {
    let (randomize_questions, question_count) = match block.presentation {
        Presentation::InOrder => ("false", None),
        Presentation::ShuffledPerRespondent { per_page } => {
            ("RandomWithXPerPage", Some(per_page.to_string()))
        }
    };
    BlockPayload {
        kind: "Standard",
        description: block.description.clone(),
        key: block.key.clone(),
        block_elements: block
            .question_ids
            .iter()
            .map(|id| BlockElement {
                kind: "Question",
                question_id: id.clone(),
            })
            .collect(),
        options: BlockOptions {
            block_locking: "false",
            randomize_questions,
            question_count,
            block_visibility: "Expanded",
        },
    }
}

// Questions

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionPayload {
    pub question_text: String,
    pub data_export_tag: String,
    pub question_type: &'static str,
    pub selector: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_selector: Option<&'static str>,
    pub configuration: QuestionConfiguration,
    pub question_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<NumberedLabels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_order: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<NumberedLabels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_order: Option<Vec<String>>,
    pub validation: Validation,
    pub language: Vec<String>,
    #[serde(rename = "QuestionID")]
    pub question_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionConfiguration {
    pub question_description_option: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_position: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_column_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_headers: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_space: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_first: Option<bool>,
}

impl QuestionConfiguration {
    fn text() -> Self {
        Self {
            question_description_option: "UseText",
            ..Self::default()
        }
    }

    fn text_entry() -> Self {
        Self {
            input_width: Some(100),
            input_height: Some(1),
            ..Self::text()
        }
    }

    fn matrix() -> Self {
        Self {
            text_position: Some("inline"),
            choice_column_width: Some(25),
            repeat_headers: Some("none"),
            white_space: Some("ON"),
            mobile_first: Some(true),
            ..Self::text()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Validation {
    pub settings: ValidationSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_response: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_response_type: Option<&'static str>,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_number: Option<ValidNumber>,
}

/// Numeric bounds, sent as strings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidNumber {
    pub min: String,
    pub max: String,
}

impl Validation {
    fn new(force_response: bool) -> Self {
        let forced = force_response.then_some("ON");
        Self {
            settings: ValidationSettings {
                force_response: forced,
                force_response_type: forced,
                kind: "None",
                content_type: None,
                valid_number: None,
            },
        }
    }

    fn number_between(force_response: bool, min: i64, max: i64) -> Self {
        let mut validation = Self::new(force_response);
        validation.settings.kind = "ContentType";
        validation.settings.content_type = Some("ValidNumber");
        validation.settings.valid_number = Some(ValidNumber {
            min: min.to_string(),
            max: max.to_string(),
        });
        validation
    }
}

pub fn question_payload(question: &Question) -> QuestionPayload {
    let mut payload = QuestionPayload {
        question_text: question.text.clone(),
        data_export_tag: question.export_tag.clone(),
        question_type: "MC",
        selector: "SAVR",
        sub_selector: Some("TX"),
        configuration: QuestionConfiguration::text(),
        question_description: question.label.clone(),
        choices: None,
        choice_order: None,
        answers: None,
        answer_order: None,
        validation: Validation::new(question.force_response),
        language: Vec::new(),
        question_id: question.id.clone(),
    };

    match &question.kind {
        QuestionKind::Consent { choices } | QuestionKind::DemographicChoice { choices } => {
            let labels = NumberedLabels(choices.clone());
            payload.choice_order = Some(labels.order());
            payload.choices = Some(labels);
        }
        QuestionKind::DemographicNumeric { min, max } => {
            payload.question_type = "TE";
            payload.selector = "SL";
            payload.sub_selector = None;
            payload.configuration = QuestionConfiguration::text_entry();
            payload.validation = Validation::number_between(question.force_response, *min, *max);
        }
        QuestionKind::FreeText { multiline } => {
            payload.question_type = "TE";
            payload.selector = if *multiline { "ML" } else { "SL" };
            payload.sub_selector = None;
            payload.configuration = QuestionConfiguration::text_entry();
        }
        QuestionKind::LikertMatrix { statements, scale } => {
            payload.question_type = "Matrix";
            payload.selector = "Likert";
            payload.sub_selector = Some("SingleAnswer");
            payload.configuration = QuestionConfiguration::matrix();
            let statements = NumberedLabels(statements.clone());
            let scale = NumberedLabels(scale.clone());
            payload.choice_order = Some(statements.order());
            payload.choices = Some(statements);
            payload.answer_order = Some(scale.order());
            payload.answers = Some(scale);
        }
        QuestionKind::DebriefText => {
            payload.question_type = "DB";
            payload.selector = "TB";
            payload.sub_selector = None;
        }
    }

    payload
}

// Flow

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowPayload {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    pub flow: Vec<FlowElement>,
    pub properties: FlowProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowProperties {
    pub count: usize,
    pub removed_fieldsets: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "Type")]
pub enum FlowElement {
    Block(FlowBlock),
    EmbeddedData(FlowEmbeddedData),
    Randomizer(FlowRandomizer),
    Group(FlowGroup),
    EndSurvey(FlowEndSurvey),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowBlock {
    #[serde(rename = "ID")]
    pub block_id: String,
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    #[serde(rename = "Options", skip_serializing_if = "Option::is_none")]
    pub options: Option<FlowBlockOptions>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowBlockOptions {
    pub skip_logic: SkipLogic,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkipLogic {
    #[serde(rename = "SkipLogicID")]
    pub skip_logic_id: String,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub branch_logic: BranchLogic,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchLogic {
    #[serde(rename = "0")]
    pub conditions: ConditionGroup,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "Flow")]
    pub flow: Vec<FlowElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionGroup {
    #[serde(rename = "0")]
    pub first: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expression {
    #[serde(rename = "QuestionID")]
    pub question_id: String,
    pub choice_locator: String,
    pub operator: &'static str,
    pub right_operand: String,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub description: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowEmbeddedData {
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    pub embedded_data: Vec<EmbeddedFieldPayload>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowRandomizer {
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    pub randomizer_type: &'static str,
    pub sub_set: usize,
    pub even_presentation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomize_blocks: Option<bool>,
    pub flow: Vec<FlowElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowGroup {
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    pub description: String,
    pub flow: Vec<FlowElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowEndSurvey {
    #[serde(rename = "FlowID")]
    pub flow_id: String,
    pub ending_type: &'static str,
    pub options: EndSurveyOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndSurveyOptions {
    pub advanced: EndSurveyAdvanced,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndSurveyAdvanced {
    pub response_flag: &'static str,
}

fn flow_block(node: &BlockNode) -> FlowElement {
    let options = node.termination.as_ref().map(|termination| FlowBlockOptions {
        skip_logic: SkipLogic {
            skip_logic_id: termination.skip_logic_id.clone(),
            kind: "Branch",
            branch_logic: BranchLogic {
                conditions: ConditionGroup {
                    first: Expression {
                        question_id: termination.question_id.clone(),
                        choice_locator: format!(
                            "q://{}/SelectedChoicesRecode",
                            termination.question_id
                        ),
                        operator: "EqualTo",
                        right_operand: termination.choice_id.clone(),
                        kind: "Expression",
                        description: "If Do Not Consent",
                    },
                },
                kind: "BooleanExpression",
                flow: vec![FlowElement::EndSurvey(FlowEndSurvey {
                    flow_id: termination.end_flow_id.clone(),
                    ending_type: "Default",
                    options: EndSurveyOptions {
                        advanced: EndSurveyAdvanced {
                            response_flag: "ScreenOut",
                        },
                    },
                })],
            },
        },
    });
    FlowElement::Block(FlowBlock {
        block_id: node.block_id.clone(),
        flow_id: node.flow_id.clone(),
        options,
    })
}

fn flow_embedded_data(set: &EmbeddedDataSet) -> FlowEmbeddedData {
    FlowEmbeddedData {
        flow_id: set.flow_id.clone(),
        embedded_data: set.fields.iter().map(EmbeddedFieldPayload::from).collect(),
    }
}

fn flow_element(node: &FlowNode) -> FlowElement {
    match node {
        FlowNode::Block(block) => flow_block(block),
        FlowNode::EmbeddedDataSet(set) => FlowElement::EmbeddedData(flow_embedded_data(set)),
        FlowNode::ConditionRandomizer(randomizer) => FlowElement::Randomizer(FlowRandomizer {
            flow_id: randomizer.flow_id.clone(),
            randomizer_type: "EvenPresented",
            sub_set: 1,
            even_presentation: true,
            randomize_blocks: None,
            flow: randomizer
                .branches
                .iter()
                .map(|branch| {
                    FlowElement::Group(FlowGroup {
                        flow_id: branch.flow_id.clone(),
                        description: branch.label.clone(),
                        flow: vec![FlowElement::EmbeddedData(flow_embedded_data(
                            &branch.assignment,
                        ))],
                    })
                })
                .collect(),
        }),
        // SubSet equal to the block count: every block is shown, only the order is drawn
        FlowNode::BlockOrderRandomizer(randomizer) => FlowElement::Randomizer(FlowRandomizer {
            flow_id: randomizer.flow_id.clone(),
            randomizer_type: "Advanced",
            sub_set: randomizer.blocks.len(),
            even_presentation: false,
            randomize_blocks: Some(true),
            flow: randomizer.blocks.iter().map(flow_block).collect(),
        }),
    }
}

pub fn flow_payload(flow: &FlowRoot) -> FlowPayload {
    FlowPayload {
        kind: "Root",
        flow_id: flow.flow_id.clone(),
        flow: flow.nodes.iter().map(flow_element).collect(),
        properties: FlowProperties {
            count: flow.nodes.len(),
            removed_fieldsets: Vec::new(),
        },
    }
}

// Embedded data and options

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbeddedFieldPayload {
    pub description: String,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub field: String,
    pub variable_type: &'static str,
    pub data_visibility: Vec<String>,
    pub analyze_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl From<&EmbeddedField> for EmbeddedFieldPayload {
    fn from(field: &EmbeddedField) -> Self {
        Self {
            description: field.description.clone(),
            kind: match field.source {
                FieldSource::Recipient => "Recipient",
                FieldSource::Random => "Random",
                FieldSource::Custom => "Custom",
            },
            field: field.field.clone(),
            variable_type: "String",
            data_visibility: field.visibility.clone(),
            analyze_text: false,
            value: field.value.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionsPayload {
    pub back_button: String,
    pub save_and_continue: String,
    pub survey_protection: &'static str,
    pub ballot_box_stuffing_prevention: String,
    pub no_index: &'static str,
    pub secure_response_files: String,
    pub survey_expiration: Option<String>,
    pub survey_termination: &'static str,
    pub header: String,
    pub footer: String,
    pub progress_bar_display: &'static str,
    pub partial_data: String,
    pub validation_message: Option<String>,
    pub previous_button: String,
    pub next_button: String,
    pub survey_title: String,
    pub skin_library: &'static str,
    pub skin_type: &'static str,
    pub skin: String,
}

impl From<&SurveyOptions> for OptionsPayload {
    fn from(options: &SurveyOptions) -> Self {
        Self {
            back_button: options.back_button.to_string(),
            save_and_continue: options.save_and_continue.to_string(),
            survey_protection: match options.protection {
                SurveyProtection::PublicSurvey => "PublicSurvey",
                SurveyProtection::ByInvitation => "ByInvitation",
            },
            ballot_box_stuffing_prevention: options.ballot_box_stuffing_prevention.to_string(),
            no_index: if options.no_index { "Yes" } else { "No" },
            secure_response_files: options.secure_response_files.to_string(),
            survey_expiration: None,
            survey_termination: "DefaultMessage",
            header: String::new(),
            footer: String::new(),
            progress_bar_display: "Text",
            partial_data: options.partial_data.clone(),
            validation_message: None,
            previous_button: options.previous_button.clone(),
            next_button: options.next_button.clone(),
            survey_title: options.title.clone(),
            skin_library: "qualtrics",
            skin_type: "templated",
            skin: options.skin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qsf::{
        blocks::build_block,
        ids::IdGenerator,
        model::{SectionKind, Termination},
        questions,
    };
    use serde_json::json;

    #[test]
    fn test_numbered_labels_serialize_as_display_map() {
        let value = serde_json::to_value(NumberedLabels(vec!["Yes".into(), "No".into()])).unwrap();
        assert_eq!(value, json!({ "1": { "Display": "Yes" }, "2": { "Display": "No" } }));
    }

    #[test]
    fn test_randomized_block_payload_shows_one_question_per_page() {
        let mut ids = IdGenerator::seeded(2);
        let block = build_block(&mut ids, SectionKind::DvMeasure, vec!["QID3".into()], true)
            .named("dv_1", "Anxiety Measures");
        let value = serde_json::to_value(block_payload(&block)).unwrap();

        assert_eq!(value["ID"], "dv_1");
        assert_eq!(value["Options"]["RandomizeQuestions"], "RandomWithXPerPage");
        assert_eq!(value["Options"]["QuestionCount"], "1");
        assert_eq!(value["BlockElements"][0]["QuestionID"], "QID3");

        let empty = serde_json::to_value(block_payload(&block).without_elements()).unwrap();
        assert_eq!(empty["BlockElements"], json!([]));
    }

    #[test]
    fn test_numeric_question_carries_string_bounds() {
        let mut ids = IdGenerator::seeded(2);
        let question = questions::build_demographic_question(
            &mut ids,
            &crate::models::domain::study::DemographicSelection::numeric("age", None, None),
        )
        .unwrap();
        let value = serde_json::to_value(question_payload(&question)).unwrap();

        assert_eq!(value["QuestionType"], "TE");
        assert_eq!(value["Selector"], "SL");
        assert_eq!(value["Validation"]["Settings"]["ContentType"], "ValidNumber");
        assert_eq!(
            value["Validation"]["Settings"]["ValidNumber"],
            json!({ "Min": "1", "Max": "999" })
        );
        assert!(value.get("SubSelector").is_none());
    }

    #[test]
    fn test_matrix_question_lists_statements_and_answers() {
        let mut ids = IdGenerator::seeded(2);
        let items = vec![
            crate::models::domain::study::Item::new("I worry"),
            crate::models::domain::study::Item::new("I relax"),
        ];
        let question = questions::build_matrix_question(&mut ids, "Anxiety", &items, None);
        let value = serde_json::to_value(question_payload(&question)).unwrap();

        assert_eq!(value["QuestionType"], "Matrix");
        assert_eq!(value["SubSelector"], "SingleAnswer");
        assert_eq!(value["Choices"]["2"]["Display"], "I relax");
        assert_eq!(value["AnswerOrder"].as_array().unwrap().len(), 7);
        assert_eq!(value["Configuration"]["ChoiceColumnWidth"], 25);
        assert_eq!(value["Validation"]["Settings"]["ForceResponse"], "ON");
    }

    #[test]
    fn test_debrief_question_has_no_forced_response() {
        let mut ids = IdGenerator::seeded(2);
        let value = serde_json::to_value(question_payload(&questions::build_debrief_question(&mut ids)))
            .unwrap();
        assert_eq!(value["QuestionType"], "DB");
        assert_eq!(value["Validation"], json!({ "Settings": { "Type": "None" } }));
    }

    #[test]
    fn test_consent_node_encodes_screen_out_branch() {
        let node = BlockNode {
            flow_id: "FL_2".into(),
            block_id: "BL_x".into(),
            termination: Some(Termination {
                skip_logic_id: "SL_1".into(),
                question_id: "QID1".into(),
                choice_id: "2".into(),
                end_flow_id: "FL_3".into(),
            }),
        };
        let value = serde_json::to_value(flow_block(&node)).unwrap();

        assert_eq!(value["Type"], "Block");
        assert_eq!(value["ID"], "BL_x");
        let logic = &value["Options"]["SkipLogic"]["BranchLogic"];
        assert_eq!(logic["0"]["0"]["ChoiceLocator"], "q://QID1/SelectedChoicesRecode");
        assert_eq!(logic["0"]["0"]["RightOperand"], "2");
        assert_eq!(logic["Flow"][0]["Type"], "EndSurvey");
        assert_eq!(logic["Flow"][0]["Options"]["Advanced"]["ResponseFlag"], "ScreenOut");
    }

    #[test]
    fn test_plain_block_node_has_no_options() {
        let node = BlockNode {
            flow_id: "FL_2".into(),
            block_id: "BL_x".into(),
            termination: None,
        };
        let value = serde_json::to_value(flow_block(&node)).unwrap();
        assert_eq!(value, json!({ "Type": "Block", "ID": "BL_x", "FlowID": "FL_2" }));
    }
}

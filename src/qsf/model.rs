use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Section a block belongs to. Every kind except `DvMeasure` has a fixed flow position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Consent,
    Demographics,
    DvMeasure,
    ManipulationCheck,
    Debrief,
}

impl SectionKind {
    pub fn is_fixed(self) -> bool {
        !matches!(self, SectionKind::DvMeasure)
    }

    /// Default block key (the `ID` in the block payload).
    pub fn key(self) -> &'static str {
        match self {
            SectionKind::Consent => "consent",
            SectionKind::Demographics => "demographics",
            SectionKind::DvMeasure => "dv",
            SectionKind::ManipulationCheck => "manipulation_check",
            SectionKind::Debrief => "debrief",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Consent => "Consent",
            SectionKind::Demographics => "Demographics",
            SectionKind::DvMeasure => "Measures",
            SectionKind::ManipulationCheck => "Manipulation Check",
            SectionKind::Debrief => "Debrief",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    InOrder,
    /// Runtime policy: the survey platform reshuffles the questions for every respondent.
    ShuffledPerRespondent { per_page: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: String,
    pub section: SectionKind,
    pub key: String,
    pub description: String,
    pub question_ids: Vec<String>,
    pub presentation: Presentation,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    pub fn is_randomized(&self) -> bool {
        matches!(self.presentation, Presentation::ShuffledPerRespondent { .. })
    }

    /// Overrides the key and description derived from the section kind.
    pub fn named(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.key = key.into();
        self.description = description.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub id: String,
    pub export_tag: String,
    pub label: String,
    pub text: String,
    pub force_response: bool,
    pub kind: QuestionKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuestionKind {
    Consent { choices: Vec<String> },
    DemographicNumeric { min: i64, max: i64 },
    DemographicChoice { choices: Vec<String> },
    LikertMatrix { statements: Vec<String>, scale: Vec<String> },
    FreeText { multiline: bool },
    DebriefText,
}

/// Respondent-scoped field carried through the survey session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedField {
    pub field: String,
    pub description: String,
    pub source: FieldSource,
    pub value: Option<String>,
    pub visibility: Vec<String>,
}

impl EmbeddedField {
    pub fn new(field: &str, description: &str, source: FieldSource) -> Self {
        Self {
            field: field.to_string(),
            description: description.to_string(),
            source,
            value: None,
            visibility: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn visible_in(mut self, places: &[&str]) -> Self {
        self.visibility = places.iter().map(|p| p.to_string()).collect();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSource {
    Recipient,
    Random,
    Custom,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlowNode {
    Block(BlockNode),
    ConditionRandomizer(ConditionRandomizer),
    BlockOrderRandomizer(BlockOrderRandomizer),
    EmbeddedDataSet(EmbeddedDataSet),
}

impl FlowNode {
    pub fn flow_id(&self) -> &str {
        match self {
            FlowNode::Block(node) => &node.flow_id,
            FlowNode::ConditionRandomizer(node) => &node.flow_id,
            FlowNode::BlockOrderRandomizer(node) => &node.flow_id,
            FlowNode::EmbeddedDataSet(node) => &node.flow_id,
        }
    }

    /// Block id of a plain block node.
    pub fn block_id(&self) -> Option<&str> {
        match self {
            FlowNode::Block(node) => Some(&node.block_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockNode {
    pub flow_id: String,
    pub block_id: String,
    pub termination: Option<Termination>,
}

/// Ends the survey with a screened-out response when `question_id` is answered with `choice_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct Termination {
    pub skip_logic_id: String,
    pub question_id: String,
    pub choice_id: String,
    pub end_flow_id: String,
}

/// Picks exactly one branch per respondent, balanced across respondents.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionRandomizer {
    pub flow_id: String,
    pub branches: Vec<ConditionBranch>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConditionBranch {
    pub flow_id: String,
    pub label: String,
    pub assignment: EmbeddedDataSet,
}

/// Shows every wrapped block, in an order drawn per respondent.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockOrderRandomizer {
    pub flow_id: String,
    pub blocks: Vec<BlockNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedDataSet {
    pub flow_id: String,
    pub fields: Vec<EmbeddedField>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowRoot {
    pub flow_id: String,
    pub nodes: Vec<FlowNode>,
}

impl FlowRoot {
    /// Every block id referenced anywhere in the flow, in flow order.
    pub fn block_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        for node in &self.nodes {
            match node {
                FlowNode::Block(block) => refs.push(block.block_id.as_str()),
                FlowNode::BlockOrderRandomizer(randomizer) => {
                    refs.extend(randomizer.blocks.iter().map(|b| b.block_id.as_str()))
                }
                FlowNode::ConditionRandomizer(_) | FlowNode::EmbeddedDataSet(_) => {}
            }
        }
        refs
    }

    /// Every flow id in the tree, the root included.
    pub fn flow_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.flow_id.as_str()];
        for node in &self.nodes {
            ids.push(node.flow_id());
            match node {
                FlowNode::Block(block) => {
                    if let Some(termination) = &block.termination {
                        ids.push(&termination.end_flow_id);
                    }
                }
                FlowNode::ConditionRandomizer(randomizer) => {
                    for branch in &randomizer.branches {
                        ids.push(&branch.flow_id);
                        ids.push(&branch.assignment.flow_id);
                    }
                }
                FlowNode::BlockOrderRandomizer(randomizer) => {
                    ids.extend(randomizer.blocks.iter().map(|b| b.flow_id.as_str()))
                }
                FlowNode::EmbeddedDataSet(_) => {}
            }
        }
        ids
    }

    pub fn terminations(&self) -> impl Iterator<Item = (&BlockNode, &Termination)> {
        self.nodes.iter().filter_map(|node| match node {
            FlowNode::Block(block) => block.termination.as_ref().map(|t| (block, t)),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurveyProtection {
    PublicSurvey,
    ByInvitation,
}

/// Global presentation defaults of every generated survey.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurveyOptions {
    pub title: String,
    pub back_button: bool,
    pub save_and_continue: bool,
    pub protection: SurveyProtection,
    pub ballot_box_stuffing_prevention: bool,
    pub no_index: bool,
    pub secure_response_files: bool,
    pub partial_data: String,
    pub previous_button: String,
    pub next_button: String,
    pub skin: String,
}

impl SurveyOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            back_button: true,
            save_and_continue: true,
            protection: SurveyProtection::PublicSurvey,
            ballot_box_stuffing_prevention: true,
            no_index: true,
            secure_response_files: true,
            partial_data: "+7 days".to_string(),
            previous_button: " ← ".to_string(),
            next_button: " → ".to_string(),
            skin: "fresh_2022".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurveyMetadata {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub creator_id: String,
    pub response_set_id: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurveyElement {
    Block(Block),
    Flow(FlowRoot),
    Question(Question),
    EmbeddedData(Vec<EmbeddedField>),
    Options(SurveyOptions),
}

/// A complete survey definition, produced fresh by every assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct SurveyDocument {
    pub survey_id: String,
    pub metadata: SurveyMetadata,
    pub elements: Vec<SurveyElement>,
}

impl SurveyDocument {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.elements.iter().filter_map(|e| match e {
            SurveyElement::Block(block) => Some(block),
            _ => None,
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.elements.iter().filter_map(|e| match e {
            SurveyElement::Question(question) => Some(question),
            _ => None,
        })
    }

    pub fn flow(&self) -> Option<&FlowRoot> {
        self.elements.iter().find_map(|e| match e {
            SurveyElement::Flow(flow) => Some(flow),
            _ => None,
        })
    }

    pub fn embedded_data(&self) -> &[EmbeddedField] {
        self.elements
            .iter()
            .find_map(|e| match e {
                SurveyElement::EmbeddedData(fields) => Some(fields.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn options(&self) -> Option<&SurveyOptions> {
        self.elements.iter().find_map(|e| match e {
            SurveyElement::Options(options) => Some(options),
            _ => None,
        })
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks().find(|b| b.id == id)
    }

    pub fn block_for(&self, section: SectionKind) -> Option<&Block> {
        self.blocks().find(|b| b.section == section)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }

    /// Checks the structural invariants every assembled document must satisfy.
    pub fn check_integrity(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for question in self.questions() {
            if !seen.insert(question.id.as_str()) {
                return Err(format!("question id {} emitted twice", question.id));
            }
        }
        for block in self.blocks() {
            if !seen.insert(block.id.as_str()) {
                return Err(format!("block id {} emitted twice", block.id));
            }
            for question_id in &block.question_ids {
                if self.question(question_id).is_none() {
                    return Err(format!(
                        "block {} references missing question {}",
                        block.id, question_id
                    ));
                }
            }
        }

        let flow = self.flow().ok_or_else(|| "document has no flow".to_string())?;
        for flow_id in flow.flow_ids() {
            if !seen.insert(flow_id) {
                return Err(format!("flow id {} emitted twice", flow_id));
            }
        }

        let mut referenced = HashSet::new();
        for block_id in flow.block_refs() {
            if self.block(block_id).is_none() {
                return Err(format!("flow references missing block {}", block_id));
            }
            if !referenced.insert(block_id) {
                return Err(format!("flow references block {} twice", block_id));
            }
        }

        for (node, termination) in flow.terminations() {
            let is_consent = self
                .block(&node.block_id)
                .is_some_and(|b| b.section == SectionKind::Consent);
            let is_first_block = flow.nodes.iter().find_map(FlowNode::block_id)
                == Some(node.block_id.as_str());
            if !is_consent || !is_first_block {
                return Err(format!(
                    "terminating branch attached to non-consent block {}",
                    node.block_id
                ));
            }
            if self.question(&termination.question_id).is_none() {
                return Err(format!(
                    "termination references missing question {}",
                    termination.question_id
                ));
            }
        }

        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::study::{DependentVariable, StudySpec};

use super::{
    blocks::build_block,
    error::{SurveyError, SurveyResult},
    flow::{compose_flow, CONDITION_FIELD, RANDOM_ID_FIELD},
    ids::IdGenerator,
    model::{
        Block, EmbeddedField, FieldSource, Question, SectionKind, SurveyDocument, SurveyElement,
        SurveyMetadata, SurveyOptions,
    },
    questions,
};

pub const COMPLETION_TIME_FIELD: &str = "completion_time";
const DATA_VISIBILITY: [&str; 2] = ["dashboard", "export"];
const SURVEY_LANGUAGE: &str = "EN";

/// A section left out of the document because it had nothing to ask.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OmittedSection {
    pub key: String,
    pub section: SectionKind,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub document: SurveyDocument,
    pub omitted_sections: Vec<OmittedSection>,
}

/// Runs one assembly. Consumed by [`Assembler::assemble`] so a generator is never reused.
#[derive(Debug)]
pub struct Assembler {
    ids: IdGenerator,
    created_at: DateTime<Utc>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::with_generator(IdGenerator::new(), Utc::now())
    }

    /// Fixes the id source and creation time, which makes the output reproducible.
    pub fn with_generator(ids: IdGenerator, created_at: DateTime<Utc>) -> Self {
        Self { ids, created_at }
    }

    pub fn assemble(mut self, spec: &StudySpec) -> SurveyResult<Assembly> {
        if spec.title_text().is_none() && spec.description_text().is_none() {
            return Err(SurveyError::InvalidSpec(
                "a study needs a title or a description".to_string(),
            ));
        }

        let survey_id = self.ids.new_id("SV");
        let metadata = SurveyMetadata {
            name: spec.survey_title().to_string(),
            description: spec.description_text().map(str::to_string),
            owner_id: self.ids.new_id("UR"),
            creator_id: self.ids.new_id("UR"),
            response_set_id: self.ids.new_id("RS"),
            language: SURVEY_LANGUAGE.to_string(),
            created_at: self.created_at,
        };

        let mut sections = Sections::default();
        let templates = spec.export_settings.include_templates;

        if templates.consent {
            let question = questions::build_consent_question(&mut self.ids);
            sections.push(&mut self.ids, SectionKind::Consent, vec![question], false);
        }

        if templates.demographics {
            if spec.demographics.is_empty() {
                sections.omit(
                    SectionKind::Demographics,
                    SectionKind::Demographics.key(),
                    "no demographic fields selected",
                );
            } else {
                let built = spec
                    .demographics
                    .iter()
                    .map(|selection| questions::build_demographic_question(&mut self.ids, selection))
                    .collect::<SurveyResult<Vec<Question>>>()?;
                sections.push(&mut self.ids, SectionKind::Demographics, built, false);
            }
        }

        for dv in &spec.dependent_variables {
            self.add_measure_block(&mut sections, dv, spec);
        }

        if spec.is_experimental() {
            let prompt = spec
                .design
                .as_ref()
                .and_then(|design| design.manipulation_check.as_deref());
            let question = questions::build_manipulation_check_question(&mut self.ids, prompt);
            sections.push(&mut self.ids, SectionKind::ManipulationCheck, vec![question], false);
        }

        if templates.debrief {
            let question = questions::build_debrief_question(&mut self.ids);
            sections.push(&mut self.ids, SectionKind::Debrief, vec![question], false);
        }

        let flow = compose_flow(
            &mut self.ids,
            &sections.blocks,
            spec.design.as_ref(),
            &spec.randomization,
        );

        let mut elements: Vec<SurveyElement> =
            sections.blocks.into_iter().map(SurveyElement::Block).collect();
        elements.push(SurveyElement::Flow(flow));
        elements.extend(sections.questions.into_iter().map(SurveyElement::Question));
        elements.push(SurveyElement::EmbeddedData(embedded_data(spec)));
        elements.push(SurveyElement::Options(SurveyOptions::titled(spec.survey_title())));

        let document = SurveyDocument {
            survey_id,
            metadata,
            elements,
        };
        debug_assert_eq!(document.check_integrity(), Ok(()));

        log::info!(
            "Assembled survey {} with {} blocks and {} questions",
            document.survey_id,
            document.blocks().count(),
            document.questions().count()
        );

        Ok(Assembly {
            document,
            omitted_sections: sections.omitted,
        })
    }

    fn add_measure_block(&mut self, sections: &mut Sections, dv: &DependentVariable, spec: &StudySpec) {
        if !dv.is_measurable() {
            log::warn!("Skipping dependent variable '{}': no items to measure", dv.name);
            sections.omit(
                SectionKind::DvMeasure,
                &dv.block_key(),
                &format!("'{}' has no operationalization with items", dv.name),
            );
            return;
        }

        let built: Vec<Question> = dv
            .measured()
            .map(|op| {
                questions::build_matrix_question(&mut self.ids, &op.scale_name, &op.items, op.scale.as_ref())
            })
            .collect();
        let randomize = spec.randomization.shuffles_questions_of(dv);
        let question_ids = built.iter().map(|q| q.id.clone()).collect();
        let block = build_block(&mut self.ids, SectionKind::DvMeasure, question_ids, randomize)
            .named(dv.block_key(), format!("{} Measures", dv.name));
        sections.blocks.push(block);
        sections.questions.extend(built);
    }
}

#[derive(Default)]
struct Sections {
    blocks: Vec<Block>,
    questions: Vec<Question>,
    omitted: Vec<OmittedSection>,
}

impl Sections {
    fn push(
        &mut self,
        ids: &mut IdGenerator,
        section: SectionKind,
        built: Vec<Question>,
        randomize: bool,
    ) {
        let question_ids = built.iter().map(|q| q.id.clone()).collect();
        let block = build_block(ids, section, question_ids, randomize);
        if block.is_empty() {
            self.omit(section, &block.key, "section has no questions");
            return;
        }
        self.blocks.push(block);
        self.questions.extend(built);
    }

    fn omit(&mut self, section: SectionKind, key: &str, reason: &str) {
        self.omitted.push(OmittedSection {
            key: key.to_string(),
            section,
            reason: reason.to_string(),
        });
    }
}

fn embedded_data(spec: &StudySpec) -> Vec<EmbeddedField> {
    let mut fields = Vec::new();
    if spec.is_experimental() {
        fields.push(
            EmbeddedField::new(CONDITION_FIELD, "Experimental Condition", FieldSource::Recipient)
                .visible_in(&DATA_VISIBILITY),
        );
    }
    fields.push(
        EmbeddedField::new(COMPLETION_TIME_FIELD, "Survey Completion Time", FieldSource::Recipient)
            .visible_in(&DATA_VISIBILITY),
    );
    fields.push(
        EmbeddedField::new(RANDOM_ID_FIELD, "Random Assignment ID", FieldSource::Recipient)
            .visible_in(&DATA_VISIBILITY),
    );
    fields
}

/// Assembles a document with fresh random ids.
pub fn assemble(spec: &StudySpec) -> SurveyResult<SurveyDocument> {
    Assembler::new().assemble(spec).map(|assembly| assembly.document)
}

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use validator::Validate;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::study::StudySpec,
    qsf::{
        format::{block_payload, flow_payload, question_payload},
        model::QuestionKind,
        Assembler, Assembly, OmittedSection, SectionKind, SurveyDocument,
    },
    services::{
        replay_steps::{
            create_replay_steps, ReplayStep, CREATE_BLOCKS, CREATE_QUESTIONS, CREATE_SURVEY,
            UPDATE_FLOW,
        },
        survey_platform::{with_retries, RetryPolicy, SurveyPlatform},
    },
};

// Respondent time per question, in quarter minutes.
const CONSENT_QUARTERS: u32 = 8;
const DEMOGRAPHIC_QUARTERS: u32 = 2;
const MATRIX_ITEM_QUARTERS: u32 = 1;
const FREE_TEXT_QUARTERS: u32 = 2;
const DEBRIEF_QUARTERS: u32 = 4;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub id: String,
    pub key: String,
    pub description: String,
    pub section: SectionKind,
    pub question_count: usize,
    pub randomized: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyPreview {
    pub title: String,
    pub blocks: Vec<BlockSummary>,
    pub total_questions: usize,
    /// Whole minutes, rounded up.
    pub estimated_time: u32,
    pub omitted_sections: Vec<OmittedSection>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub survey_id: String,
    pub survey_url: String,
    pub blocks_created: usize,
    pub blocks_failed: usize,
    pub questions_created: usize,
    pub questions_failed: usize,
    pub flow_updated: bool,
}

fn question_quarters(kind: &QuestionKind) -> u32 {
    match kind {
        QuestionKind::Consent { .. } => CONSENT_QUARTERS,
        QuestionKind::DemographicNumeric { .. } | QuestionKind::DemographicChoice { .. } => {
            DEMOGRAPHIC_QUARTERS
        }
        QuestionKind::LikertMatrix { statements, .. } => {
            MATRIX_ITEM_QUARTERS * statements.len() as u32
        }
        QuestionKind::FreeText { .. } => FREE_TEXT_QUARTERS,
        QuestionKind::DebriefText => DEBRIEF_QUARTERS,
    }
}

pub struct SurveyService {
    platform: Arc<dyn SurveyPlatform>,
    steps: Vec<ReplayStep>,
    backoff: Duration,
}

impl SurveyService {
    pub fn new(platform: Arc<dyn SurveyPlatform>, max_retries: u32, backoff: Duration) -> Self {
        Self {
            platform,
            steps: create_replay_steps(max_retries),
            backoff,
        }
    }

    pub fn from_config(config: &Config, platform: Arc<dyn SurveyPlatform>) -> Self {
        Self::new(
            platform,
            config.remote_max_retries,
            Duration::from_millis(config.remote_retry_backoff_ms),
        )
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    pub fn generate(&self, spec: &StudySpec) -> AppResult<Assembly> {
        spec.validate()?;
        Ok(Assembler::new().assemble(spec)?)
    }

    pub fn preview(&self, spec: &StudySpec) -> AppResult<SurveyPreview> {
        let assembly = self.generate(spec)?;
        Ok(preview_of(&assembly))
    }

    fn policy(&self, step_name: &str) -> RetryPolicy {
        match self.steps.iter().find(|step| step.name == step_name) {
            Some(step) => RetryPolicy::new(step.max_retries, self.backoff).with_timeout(step.timeout()),
            None => RetryPolicy::new(0, self.backoff),
        }
    }

    /// Rebuilds `document` on the remote platform element by element.
    pub async fn replay(&self, document: &SurveyDocument) -> AppResult<ReplayReport> {
        let platform = self.platform.as_ref();
        let name = document.metadata.name.as_str();

        let survey_id = with_retries(self.policy(CREATE_SURVEY), "create survey", move || {
            platform.create_survey(name)
        })
        .await?;
        let survey_id = survey_id.as_str();

        let mut report = ReplayReport {
            survey_id: survey_id.to_string(),
            survey_url: platform.survey_url(survey_id),
            ..ReplayReport::default()
        };
        let mut remote_blocks: HashMap<String, String> = HashMap::new();
        let mut remote_questions: HashMap<String, String> = HashMap::new();

        for block in document.blocks() {
            let payload = block_payload(block).without_elements();
            let payload = &payload;
            let label = format!("create block {}", block.key);
            let remote_block = match with_retries(self.policy(CREATE_BLOCKS), &label, move || {
                platform.create_block(survey_id, payload)
            })
            .await
            {
                Ok(id) => id,
                Err(e) => {
                    log::error!("Skipping block {} and its questions: {}", block.key, e);
                    report.blocks_failed += 1;
                    continue;
                }
            };
            report.blocks_created += 1;

            for question in block
                .question_ids
                .iter()
                .filter_map(|id| document.question(id))
            {
                let payload = question_payload(question);
                let payload = &payload;
                let block_id = remote_block.as_str();
                let label = format!("create question {}", question.export_tag);
                match with_retries(self.policy(CREATE_QUESTIONS), &label, move || {
                    platform.create_question(survey_id, block_id, payload)
                })
                .await
                {
                    Ok(remote_id) => {
                        report.questions_created += 1;
                        remote_questions.insert(question.id.clone(), remote_id);
                    }
                    Err(e) => {
                        log::error!("Question {} was not created: {}", question.export_tag, e);
                        report.questions_failed += 1;
                    }
                }
            }
            remote_blocks.insert(block.id.clone(), remote_block);
        }

        if report.questions_created == 0 {
            return Err(AppError::RemoteApiError(format!(
                "no questions could be created in survey {}",
                survey_id
            )));
        }

        if let Some(flow) = document.flow() {
            let payload = flow_payload(&flow.retarget(&remote_blocks, &remote_questions));
            let payload = &payload;
            match with_retries(self.policy(UPDATE_FLOW), "update flow", move || {
                platform.update_flow(survey_id, payload)
            })
            .await
            {
                Ok(()) => report.flow_updated = true,
                Err(e) => log::error!("Survey {} kept its default flow: {}", survey_id, e),
            }
        }

        log::info!(
            "Replayed survey {}: {} blocks ({} failed), {} questions ({} failed), flow updated: {}",
            report.survey_id,
            report.blocks_created,
            report.blocks_failed,
            report.questions_created,
            report.questions_failed,
            report.flow_updated
        );
        Ok(report)
    }
}

pub fn preview_of(assembly: &Assembly) -> SurveyPreview {
    let document = &assembly.document;
    let blocks: Vec<BlockSummary> = document
        .blocks()
        .map(|block| BlockSummary {
            id: block.id.clone(),
            key: block.key.clone(),
            description: block.description.clone(),
            section: block.section,
            question_count: block.question_ids.len(),
            randomized: block.is_randomized(),
        })
        .collect();
    let quarters: u32 = document.questions().map(|q| question_quarters(&q.kind)).sum();

    SurveyPreview {
        title: document.metadata.name.clone(),
        total_questions: blocks.iter().map(|b| b.question_count).sum(),
        blocks,
        estimated_time: quarters.div_ceil(4),
        omitted_sections: assembly.omitted_sections.clone(),
    }
}

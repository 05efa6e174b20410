use std::time::Duration;

pub const CREATE_SURVEY: &str = "create_survey";
pub const CREATE_BLOCKS: &str = "create_blocks";
pub const CREATE_QUESTIONS: &str = "create_questions";
pub const UPDATE_FLOW: &str = "update_flow";

const SURVEY_CREATION_TIMEOUT: u64 = 15;
const BLOCK_CREATION_TIMEOUT: u64 = 15;
const QUESTION_CREATION_TIMEOUT: u64 = 20;
const FLOW_UPDATE_TIMEOUT: u64 = 30;

/// Survey creation is never retried.
const SURVEY_CREATION_RETRIES: u32 = 0;

/// One stage of replaying a document against the remote platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    pub name: String,
    pub description: Option<String>,
    pub max_retries: u32,
    pub timeout_seconds: Option<u64>,
}

impl ReplayStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            max_retries: 3,
            timeout_seconds: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Replay plan; `max_retries` applies to the per-element steps.
pub fn create_replay_steps(max_retries: u32) -> Vec<ReplayStep> {
    vec![
        create_survey_step(),
        create_blocks_step(max_retries),
        create_questions_step(max_retries),
        update_flow_step(max_retries),
    ]
}

fn create_survey_step() -> ReplayStep {
    ReplayStep::new(CREATE_SURVEY)
        .with_description("Create an empty survey definition on the remote platform")
        .with_max_retries(SURVEY_CREATION_RETRIES)
        .with_timeout(SURVEY_CREATION_TIMEOUT)
}

fn create_blocks_step(max_retries: u32) -> ReplayStep {
    ReplayStep::new(CREATE_BLOCKS)
        .with_description("Create each block of the document and record its remote id")
        .with_max_retries(max_retries)
        .with_timeout(BLOCK_CREATION_TIMEOUT)
}

fn create_questions_step(max_retries: u32) -> ReplayStep {
    ReplayStep::new(CREATE_QUESTIONS)
        .with_description("Create every question inside the remote block that holds it")
        .with_max_retries(max_retries)
        .with_timeout(QUESTION_CREATION_TIMEOUT)
}

fn update_flow_step(max_retries: u32) -> ReplayStep {
    ReplayStep::new(UPDATE_FLOW)
        .with_description("Replace the survey flow with the document flow remapped to remote ids")
        .with_max_retries(max_retries)
        .with_timeout(FLOW_UPDATE_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_replay_steps_returns_expected_order() {
        let steps = create_replay_steps(3);

        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![CREATE_SURVEY, CREATE_BLOCKS, CREATE_QUESTIONS, UPDATE_FLOW]
        );
    }

    #[test]
    fn test_create_replay_steps_has_expected_retries_and_timeouts() {
        let steps = create_replay_steps(2);

        assert_eq!(steps[0].max_retries, SURVEY_CREATION_RETRIES);
        assert_eq!(steps[0].timeout_seconds, Some(SURVEY_CREATION_TIMEOUT));

        assert_eq!(steps[1].max_retries, 2);
        assert_eq!(steps[1].timeout_seconds, Some(BLOCK_CREATION_TIMEOUT));

        assert_eq!(steps[2].max_retries, 2);
        assert_eq!(steps[2].timeout(), Some(Duration::from_secs(QUESTION_CREATION_TIMEOUT)));

        assert_eq!(steps[3].max_retries, 2);
        assert_eq!(steps[3].timeout_seconds, Some(FLOW_UPDATE_TIMEOUT));
    }

    #[test]
    fn test_create_replay_steps_have_descriptions() {
        let steps = create_replay_steps(3);

        assert!(steps
            .iter()
            .all(|step| step.description.as_ref().is_some_and(|d| !d.is_empty())));
    }

    #[test]
    fn test_replay_step_builder_defaults() {
        let step = ReplayStep::new("custom");

        assert_eq!(step.max_retries, 3);
        assert_eq!(step.timeout(), None);
        assert_eq!(step.with_timeout(5).timeout(), Some(Duration::from_secs(5)));
    }
}

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::{
    errors::{AppError, AppResult},
    qsf::format::{BlockPayload, FlowPayload, QuestionPayload},
};

/// A hosted survey platform that can rebuild a document through its definition API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SurveyPlatform: Send + Sync {
    async fn create_survey(&self, name: &str) -> AppResult<String>;

    async fn create_block(&self, survey_id: &str, block: &BlockPayload) -> AppResult<String>;

    async fn create_question(
        &self,
        survey_id: &str,
        block_id: &str,
        question: &QuestionPayload,
    ) -> AppResult<String>;

    async fn update_flow(&self, survey_id: &str, flow: &FlowPayload) -> AppResult<()>;

    fn survey_url(&self, survey_id: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CreatedSurvey {
    #[serde(rename = "SurveyID")]
    survey_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedBlock {
    #[serde(rename = "BlockID")]
    block_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedQuestion {
    #[serde(rename = "QuestionID")]
    question_id: String,
}

pub struct QualtricsClient {
    http: reqwest::Client,
    api_token: SecretString,
    datacenter: String,
}

impl QualtricsClient {
    pub fn new(api_token: SecretString, datacenter: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token,
            datacenter: datacenter.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "https://{}.qualtrics.com/API/v3/{}",
            self.datacenter,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("X-API-TOKEN", self.api_token.expose_secret())
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl SurveyPlatform for QualtricsClient {
    async fn create_survey(&self, name: &str) -> AppResult<String> {
        let created: Envelope<CreatedSurvey> = self
            .request(reqwest::Method::POST, "survey-definitions")
            .json(&json!({
                "SurveyName": name,
                "Language": "EN",
                "ProjectCategory": "CORE",
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        log::info!("Created remote survey {}", created.result.survey_id);
        Ok(created.result.survey_id)
    }

    async fn create_block(&self, survey_id: &str, block: &BlockPayload) -> AppResult<String> {
        let created: Envelope<CreatedBlock> = self
            .request(
                reqwest::Method::POST,
                &format!("survey-definitions/{}/blocks", survey_id),
            )
            .json(block)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created.result.block_id)
    }

    async fn create_question(
        &self,
        survey_id: &str,
        block_id: &str,
        question: &QuestionPayload,
    ) -> AppResult<String> {
        let created: Envelope<CreatedQuestion> = self
            .request(
                reqwest::Method::POST,
                &format!("survey-definitions/{}/questions", survey_id),
            )
            .query(&[("blockId", block_id)])
            .json(question)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created.result.question_id)
    }

    async fn update_flow(&self, survey_id: &str, flow: &FlowPayload) -> AppResult<()> {
        self.request(
            reqwest::Method::PUT,
            &format!("survey-definitions/{}/flow", survey_id),
        )
        .json(flow)
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }

    fn survey_url(&self, survey_id: &str) -> String {
        format!("https://{}.qualtrics.com/jfe/form/{}", self.datacenter, survey_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs `call` until it succeeds, fails permanently, or the retries are spent.
/// Each attempt is bounded by the policy timeout; an elapsed attempt counts as transient.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, label: &str, mut call: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        let outcome = match policy.timeout {
            Some(limit) => tokio::time::timeout(limit, call())
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::RemoteUnavailable(format!(
                        "{} timed out after {:?}",
                        label, limit
                    )))
                }),
            None => call().await,
        };

        match outcome {
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                log::warn!(
                    "{} failed (attempt {}/{}): {}",
                    label,
                    attempt,
                    policy.max_retries + 1,
                    e
                );
                tokio::time::sleep(backoff_delay(&policy, attempt)).await;
            }
            other => return other,
        }
    }
}

/// Linear backoff, saturating at `Duration::MAX`.
fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.backoff.saturating_mul(attempt)
}

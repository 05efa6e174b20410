use std::env;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub openai_api_key: SecretString,
    pub openai_model: String,
    pub qualtrics_api_token: SecretString,
    pub qualtrics_datacenter: String,
    pub max_upload_bytes: usize,
    pub remote_max_retries: u32,
    pub remote_retry_backoff_ms: u64,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parsed("WEB_SERVER_PORT", 3000),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            qualtrics_api_token: SecretString::from(
                env::var("QUALTRICS_API_TOKEN").unwrap_or_default(),
            ),
            qualtrics_datacenter: env::var("QUALTRICS_DATACENTER")
                .unwrap_or_else(|_| "yul1".to_string()),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            remote_max_retries: parsed("REMOTE_MAX_RETRIES", 3),
            remote_retry_backoff_ms: parsed("REMOTE_RETRY_BACKOFF_MS", 500),
        }
    }

    /// Checks the secrets the remote collaborators need. QSF generation works without them.
    pub fn validate_for_production(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.openai_api_key.expose_secret().trim().is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.qualtrics_api_token.expose_secret().trim().is_empty() {
            missing.push("QUALTRICS_API_TOKEN");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(format!(
                "missing configuration: {}",
                missing.join(", ")
            )))
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 3000,
            openai_api_key: SecretString::from("test-openai-key".to_string()),
            openai_model: "gpt-3.5-turbo".to_string(),
            qualtrics_api_token: SecretString::from("test-qualtrics-token".to_string()),
            qualtrics_datacenter: "yul1".to_string(),
            max_upload_bytes: 64 * 1024,
            remote_max_retries: 2,
            remote_retry_backoff_ms: 0,
        }
    }
}

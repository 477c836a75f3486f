//! Outbound client for the external application-intake system.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;

/// A completed application record, serialized as the intake endpoint
/// expects it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub telegram_id: String,
    pub fio: String,
    pub phone: String,
    pub program: String,
}

/// Receives completed application records.
#[async_trait]
pub trait IntakeGateway: Send + Sync {
    async fn submit(&self, record: &ApplicationRecord) -> Result<(), SubmissionError>;
}

#[derive(Debug, Deserialize)]
struct IntakeResponse {
    #[serde(default)]
    status: String,
}

/// HTTP intake client. The request is bounded by a timeout so a hung
/// endpoint surfaces as `SubmissionError` instead of stalling the
/// conversation.
pub struct HttpIntakeGateway {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpIntakeGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl IntakeGateway for HttpIntakeGateway {
    async fn submit(&self, record: &ApplicationRecord) -> Result<(), SubmissionError> {
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmissionError::Timeout(self.timeout)
                } else {
                    SubmissionError::Transport(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SubmissionError::HttpStatus(status.as_u16()));
        }

        let body: IntakeResponse = resp.json().await?;
        if body.status == "success" {
            Ok(())
        } else {
            Err(SubmissionError::Rejected(body.status))
        }
    }
}

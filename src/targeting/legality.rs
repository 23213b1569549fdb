//! Legality checks against the rules engine.

use crate::config::EngineConfig;
use crate::game::stack::ResolutionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Request element sent to the rules engine: `{controller_id, source_id, targets}`
pub type LegalityContext = ResolutionContext;

/// Engine verdict for one submitted context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalityResult {
    pub legal: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Tri-state legality. Only `Legal` allows an action to be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegalityStatus {
    Legal,
    Illegal,
    #[default]
    Unknown,
}

impl From<&LegalityResult> for LegalityStatus {
    fn from(result: &LegalityResult) -> Self {
        if result.legal {
            LegalityStatus::Legal
        } else {
            LegalityStatus::Illegal
        }
    }
}

#[derive(Error, Debug)]
pub enum LegalityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rules engine returned status {0}")]
    Status(u16),
    #[error("Expected {expected} legality results, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Anything that can answer a batch of legality questions, in order
#[async_trait]
pub trait LegalityChecker: Send + Sync {
    async fn check(
        &self,
        contexts: &[LegalityContext],
    ) -> Result<Vec<LegalityResult>, LegalityError>;
}

/// Legality checker that POSTs the batch to the rules engine over HTTP
#[derive(Debug, Clone)]
pub struct HttpLegalityClient {
    client: reqwest::Client,
    url: String,
}

impl HttpLegalityClient {
    pub fn new(config: &EngineConfig) -> Result<Self, LegalityError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(HttpLegalityClient {
            client,
            url: config.legality_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LegalityChecker for HttpLegalityClient {
    #[instrument(skip_all, fields(url = %self.url, batch = contexts.len()))]
    async fn check(
        &self,
        contexts: &[LegalityContext],
    ) -> Result<Vec<LegalityResult>, LegalityError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.client.post(&self.url).json(contexts).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LegalityError::Status(status.as_u16()));
        }

        let results: Vec<LegalityResult> = response.json().await?;
        if results.len() != contexts.len() {
            return Err(LegalityError::LengthMismatch {
                expected: contexts.len(),
                actual: results.len(),
            });
        }

        debug!(
            legal = results.iter().filter(|r| r.legal).count(),
            "legality batch answered"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stack::TargetRef;
    use crate::game::zones::{ObjectId, PlayerId};

    #[test]
    fn test_context_wire_shape() {
        let context = LegalityContext {
            controller_id: Some(PlayerId::from("p1")),
            source_id: Some(ObjectId::from("bolt")),
            targets: vec![TargetRef::Object(ObjectId::from("bear"))],
        };
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "controller_id": "p1",
                "source_id": "bolt",
                "targets": [{"kind": "object", "id": "bear"}]
            })
        );
    }

    #[test]
    fn test_result_to_status() {
        let legal: LegalityResult = serde_json::from_str(r#"{"legal":true}"#).unwrap();
        let illegal: LegalityResult =
            serde_json::from_str(r#"{"legal":false,"issues":["hexproof"]}"#).unwrap();
        assert_eq!(LegalityStatus::from(&legal), LegalityStatus::Legal);
        assert_eq!(LegalityStatus::from(&illegal), LegalityStatus::Illegal);
        assert_eq!(LegalityStatus::default(), LegalityStatus::Unknown);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let config = EngineConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = HttpLegalityClient::new(&config).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9/api/legality/check");
        assert!(client.check(&[]).await.unwrap().is_empty());
    }
}

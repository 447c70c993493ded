use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// The visible part of a push message.
#[derive(Debug, Clone, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Why a single device delivery failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("device token is no longer registered")]
    Unregistered,
    #[error("device token is malformed")]
    InvalidToken,
    #[error("{0}")]
    Other(String),
}

impl DeliveryError {
    /// Whether the token should be dropped from the owner's device set.
    pub fn invalidates_token(&self) -> bool {
        matches!(self, DeliveryError::Unregistered | DeliveryError::InvalidToken)
    }
}

/// Per-token delivery result within a multicast.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub token: String,
    pub error: Option<DeliveryError>,
}

/// Failure of the multicast as a whole; no per-token outcomes exist.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("push service returned status {0}")]
    Status(u16),
}

/// Delivery backend. One multicast call covers all of a user's devices.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &PushNotification,
        data: &HashMap<String, String>,
    ) -> Result<Vec<DeliveryOutcome>, PushError>;
}

/// Logs instead of sending. Used when no push credentials are configured.
pub struct MockPushProvider;

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &PushNotification,
        _data: &HashMap<String, String>,
    ) -> Result<Vec<DeliveryOutcome>, PushError> {
        tracing::info!(
            "Mock push delivery to {} tokens: {}",
            tokens.len(),
            notification.title
        );
        Ok(tokens
            .iter()
            .map(|token| DeliveryOutcome {
                token: token.clone(),
                error: None,
            })
            .collect())
    }
}

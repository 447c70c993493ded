use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::push::{DeliveryError, DeliveryOutcome, PushError, PushNotification, PushProvider};

/// FCM legacy HTTP client. One request fans out to every device token.
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmClient {
    pub fn new(server_key: String, endpoint: String) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            server_key,
        })
    }
}

#[derive(Serialize)]
struct MulticastRequest<'a> {
    registration_ids: &'a [String],
    notification: &'a PushNotification,
    data: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct MulticastResponse {
    #[serde(default)]
    results: Vec<MulticastResult>,
}

#[derive(Debug, Deserialize)]
struct MulticastResult {
    error: Option<String>,
}

fn classify(code: &str) -> DeliveryError {
    match code {
        "NotRegistered" => DeliveryError::Unregistered,
        "InvalidRegistration" => DeliveryError::InvalidToken,
        other => DeliveryError::Other(other.to_string()),
    }
}

// Results come back positionally; a short reply marks the tail failed.
fn pair_outcomes(tokens: &[String], results: &[MulticastResult]) -> Vec<DeliveryOutcome> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| DeliveryOutcome {
            token: token.clone(),
            error: match results.get(i) {
                Some(result) => result.error.as_deref().map(classify),
                None => Some(DeliveryError::Other("missing delivery result".to_string())),
            },
        })
        .collect()
}

#[async_trait]
impl PushProvider for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &PushNotification,
        data: &HashMap<String, String>,
    ) -> Result<Vec<DeliveryOutcome>, PushError> {
        let request = MulticastRequest {
            registration_ids: tokens,
            notification,
            data,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }
        let body: MulticastResponse = response.json().await?;
        Ok(pair_outcomes(tokens, &body.results))
    }
}

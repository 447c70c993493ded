use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use mishwar_domain::repository::UserTokenRepository;

use crate::push::{PushNotification, PushProvider};

/// How a dispatch went, token by token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub target_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Sends one notification to a set of device tokens and prunes tokens the
/// provider reports as dead. Delivery problems are logged, never raised.
pub struct Dispatcher {
    provider: Arc<dyn PushProvider>,
    tokens: Arc<dyn UserTokenRepository>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn PushProvider>, tokens: Arc<dyn UserTokenRepository>) -> Self {
        Self { provider, tokens }
    }

    /// Multicasts to `tokens`. When `owner` is given, tokens the provider
    /// rejects as unregistered or malformed are removed from that user's
    /// device set; cleanup failures only get logged.
    pub async fn send_to_tokens(
        &self,
        tokens: &[String],
        notification: &PushNotification,
        data: &HashMap<String, String>,
        owner: Option<&str>,
    ) -> DispatchSummary {
        if tokens.is_empty() {
            debug!("No device tokens to notify, skipping dispatch");
            return DispatchSummary::default();
        }

        let outcomes = match self.provider.send_multicast(tokens, notification, data).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                error!("Push delivery failed for all {} tokens: {}", tokens.len(), e);
                return DispatchSummary {
                    target_count: tokens.len(),
                    success_count: 0,
                    failure_count: tokens.len(),
                };
            }
        };

        let mut success_count = 0;
        let mut invalid: Vec<String> = Vec::new();
        for outcome in &outcomes {
            match &outcome.error {
                None => success_count += 1,
                Some(e) if e.invalidates_token() => invalid.push(outcome.token.clone()),
                Some(e) => warn!("Push delivery failed for a token: {}", e),
            }
        }

        if !invalid.is_empty() {
            match owner {
                Some(owner) => {
                    info!("Removing {} invalid tokens for user {}", invalid.len(), owner);
                    if let Err(e) = self.tokens.remove_tokens(owner, &invalid).await {
                        error!("Failed to remove invalid tokens for {}: {}", owner, e);
                    }
                }
                None => debug!("No owner for {} invalid tokens, skipping cleanup", invalid.len()),
            }
        }

        let summary = DispatchSummary {
            target_count: tokens.len(),
            success_count,
            failure_count: tokens.len() - success_count,
        };
        info!(
            "Dispatched notification to {} tokens: {} ok, {} failed",
            summary.target_count, summary.success_count, summary.failure_count
        );
        summary
    }
}

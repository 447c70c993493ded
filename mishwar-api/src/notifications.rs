use std::collections::HashMap;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use mishwar_notify::{DispatchSummary, PushNotification};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/notifications/test", post(send_test_notification))
}

#[derive(Debug, Deserialize)]
struct TestNotificationRequest {
    token: Option<String>,
}

/// Lets a signed-in user check the push pipeline end to end against one of
/// their own device tokens.
async fn send_test_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<TestNotificationRequest>,
) -> Result<Json<DispatchSummary>, AppError> {
    let token = request
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Device token is required"))?;

    let notification = PushNotification {
        title: "Test notification".to_string(),
        body: "Push notifications are working correctly".to_string(),
    };
    let mut data = HashMap::new();
    data.insert("type".to_string(), "test".to_string());

    let summary = state
        .dispatcher
        .send_to_tokens(&[token.to_string()], &notification, &data, Some(&user.uid))
        .await;

    Ok(Json(summary))
}

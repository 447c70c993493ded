use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/devices", post(register_device))
}

#[derive(Debug, Deserialize)]
struct RegisterDeviceRequest {
    token: Option<String>,
}

/// Registers a device token for the caller so booking notifications can
/// reach that device. Saving an already-known token is a no-op.
async fn register_device(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<RegisterDeviceRequest>,
) -> Result<StatusCode, AppError> {
    let token = request
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Device token is required"))?;

    state.user_tokens.save_token(&user.uid, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

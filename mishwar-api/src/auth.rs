use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use mishwar_domain::identity::{AuthUser, NameCandidates, TokenVerifier, VerifyError};

use crate::error::AppError;
use crate::state::AppState;

/// Claims carried by an HS256 identity token. Name fields are all optional;
/// whichever are present feed display-name resolution.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct JwtTokenVerifier {
    secret: String,
}

impl JwtTokenVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        let token_data = decode::<IdTokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            VerifyError::InvalidToken
        })?;

        let claims = token_data.claims;
        let name = NameCandidates {
            display_name: claims.display_name,
            full_name: claims.full_name,
            name: claims.name,
            username: claims.username,
            first_name: claims.first_name,
            last_name: claims.last_name,
        }
        .resolve();

        Ok(AuthUser {
            uid: claims.sub,
            email: claims.email,
            name,
        })
    }
}

/// The authenticated caller. Handlers that take this reject unauthenticated
/// requests before running.
pub struct CurrentUser(pub AuthUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Extract token from Authorization header
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("Authentication token is missing"))?;
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::unauthenticated("Authentication token is missing"))?;

        // 2. Verify and resolve the caller identity
        let user = state
            .verifier
            .verify(token)
            .await
            .map_err(|_| AppError::unauthenticated("Invalid or expired token"))?;

        Ok(CurrentUser(user))
    }
}

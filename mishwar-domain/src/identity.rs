use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal fallback when no display-name candidate survives cleaning.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// An authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Verifies bearer tokens issued by the identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError>;
}

/// Display-name candidates in priority order. Identity providers expose the
/// name under several shapes; the first candidate surviving
/// [`clean_display_name`] wins and [`DEFAULT_DISPLAY_NAME`] is the terminal
/// fallback.
#[derive(Debug, Clone, Default)]
pub struct NameCandidates {
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NameCandidates {
    fn ranked(&self) -> [Option<String>; 5] {
        [
            self.display_name.clone(),
            self.full_name.clone(),
            self.name.clone(),
            self.username.clone(),
            self.joined_first_last(),
        ]
    }

    fn joined_first_last(&self) -> Option<String> {
        let first = self.first_name.as_deref().map(str::trim).unwrap_or("");
        let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
        let joined = format!("{first} {last}");
        let joined = joined.trim();
        if joined.is_empty() {
            None
        } else {
            Some(joined.to_string())
        }
    }

    pub fn resolve(&self) -> String {
        self.ranked()
            .into_iter()
            .flatten()
            .find_map(|candidate| clean_display_name(&candidate))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
    }
}

/// Strips control characters (keeping tab/newline for the trim), trims, and
/// rejects empty or email-looking values.
pub fn clean_display_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || looks_like_email(cleaned) {
        return None;
    }
    Some(cleaned.to_string())
}

pub fn looks_like_email(value: &str) -> bool {
    value.split_whitespace().any(|word| {
        let Some((local, domain)) = word.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        match domain.rsplit_once('.') {
            Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
            None => false,
        }
    })
}

/// Development-only verifier. Accepts `mock:<uid>[:<email>[:<name>]]` or an
/// unpadded base64url JSON document `{"uid", "email"?, "name"?}`.
pub struct MockTokenVerifier;

#[derive(Debug, Deserialize)]
struct MockTokenPayload {
    uid: String,
    email: Option<String>,
    name: Option<String>,
}

impl MockTokenVerifier {
    fn decode(token: &str) -> Option<(String, Option<String>, Option<String>)> {
        if let Some(rest) = token.strip_prefix("mock:") {
            let mut parts = rest.splitn(3, ':');
            let uid = parts.next().map(str::trim).filter(|v| !v.is_empty())?;
            let email = parts
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            let name = parts
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            return Some((uid.to_string(), email, name));
        }

        let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
        let payload: MockTokenPayload = serde_json::from_slice(&bytes).ok()?;
        let uid = payload.uid.trim();
        if uid.is_empty() {
            return None;
        }
        Some((
            uid.to_string(),
            payload.email.filter(|v| !v.trim().is_empty()),
            payload.name,
        ))
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        let (uid, email, name) =
            Self::decode(token).ok_or(VerifyError::InvalidToken)?;
        tracing::debug!("Accepted mock bearer token for uid {}", uid);
        let candidates = NameCandidates {
            name,
            ..NameCandidates::default()
        };
        Ok(AuthUser {
            uid,
            email,
            name: candidates.resolve(),
        })
    }
}

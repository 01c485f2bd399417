//! Bearer-token issuance and the `AuthUser` extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use sitor_shared::constants::DEFAULT_ROLE;
use sitor_shared::ObjectId;

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    /// Always [`DEFAULT_ROLE`]; kept for client compatibility.
    pub role: String,
    pub exp: i64,
}

/// HS256 signing and verification keys derived from `SECRET_KEY`.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: ObjectId, email: &str) -> Result<String, ServerError> {
        self.issue_at(user_id, email, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: ObjectId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ServerError> {
        let claims = Claims {
            user_id: user_id.to_hex(),
            email: email.to_string(),
            role: DEFAULT_ROLE.to_string(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServerError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                ServerError::Unauthorized("Invalid token".into())
            })
    }
}

/// The caller identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ServerError::Unauthorized("Missing token".into()))?;

        // A bare token without the scheme is accepted too.
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        let claims = state.tokens.verify(token)?;
        let user_id = ObjectId::from_hex(&claims.user_id)
            .map_err(|_| ServerError::Unauthorized("Invalid token".into()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let keys = TokenKeys::new("test-secret", 72);
        let user = ObjectId::new();
        let token = keys.issue(user, "ayu@example.com").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, user.to_hex());
        assert_eq!(claims.email, "ayu@example.com");
        assert_eq!(claims.role, "neutral");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenKeys::new("a", 72).issue(ObjectId::new(), "x@y.z").unwrap();
        let err = TokenKeys::new("b", 72).verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = TokenKeys::new("test-secret", 72);
        let long_ago = Utc::now() - Duration::days(4);
        let token = keys.issue_at(ObjectId::new(), "x@y.z", long_ago).unwrap();
        assert!(matches!(keys.verify(&token), Err(ServerError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = TokenKeys::new("test-secret", 72);
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }
}

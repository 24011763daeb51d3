//! Auth provider boundary.
//!
//! The hosted auth provider signs session JWTs with a shared secret; this
//! module verifies them and hands each handler an `AuthSession`. The user
//! table itself lives with the provider — we only ever see the session view.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use huddle_core::models::{AuthSession, SessionMeta, SessionUser};

use crate::http::HttpState;

/// Claims inside a provider-issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub iat: Option<i64>,
    pub exp: i64,
}

/// Session view of a verified token plus request metadata. The token issue
/// time doubles as the session's `updatedAt` — the provider re-issues the
/// token whenever it refreshes the session.
fn build_session(
    claims: SessionClaims,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AuthSession {
    AuthSession {
        user: SessionUser {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            image: claims.image,
            email_verified: claims.email_verified,
        },
        session: SessionMeta {
            ip_address,
            user_agent,
            updated_at: claims.iat.and_then(|t| chrono::DateTime::from_timestamp(t, 0)),
        },
    }
}

/// Extractor wrapper: pulls the bearer token from `Authorization`, verifies
/// it, and captures request metadata (ip, user agent) into the session.
pub struct Session(pub AuthSession);

pub struct AuthRejection(&'static str);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "UNAUTHORIZED",
                "message": self.0,
            })),
        )
            .into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<HttpState>> for Session {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<HttpState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthRejection("Missing bearer token"))?;

        let decoded = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(state.session_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            AuthRejection("Invalid session token")
        })?;

        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(Session(build_session(
            decoded.claims,
            header_str("x-forwarded-for"),
            header_str("user-agent"),
        )))
    }
}

/// Mint a session token the way the provider does. Used by local tooling and
/// integration tests; production tokens come from the hosted provider.
pub fn encode_session_token(
    secret: &str,
    user: &SessionUser,
    ttl_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        image: user.image.clone(),
        email_verified: user.email_verified,
        iat: Some(now),
        exp: now + ttl_seconds,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_round_trips_claims() {
        let user = SessionUser {
            id: "user-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image: None,
            email_verified: true,
        };
        let token = encode_session_token("secret", &user, 60).unwrap();

        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "user-1");
        assert_eq!(decoded.claims.email, "ada@example.com");
        assert!(decoded.claims.email_verified);
    }

    #[test]
    fn token_issue_time_becomes_session_updated_at() {
        let user = SessionUser {
            id: "user-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image: None,
            email_verified: true,
        };
        let token = encode_session_token("secret", &user, 60).unwrap();
        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();

        let session = build_session(decoded.claims, None, Some("cli/1.0".to_string()));
        let updated_at = session.session.updated_at.expect("issue time should be set");
        let age = (chrono::Utc::now() - updated_at).num_seconds();
        assert!((0..5).contains(&age), "updated_at should be now, was {age}s ago");
        assert_eq!(session.session.user_agent.as_deref(), Some("cli/1.0"));
    }

    #[test]
    fn claims_without_issue_time_leave_updated_at_unset() {
        let claims = SessionClaims {
            sub: "user-2".to_string(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            image: None,
            email_verified: false,
            iat: None,
            exp: chrono::Utc::now().timestamp() + 60,
        };
        let session = build_session(claims, Some("10.0.0.1".to_string()), None);
        assert!(session.session.updated_at.is_none());
        assert_eq!(session.session.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn expired_session_token_fails_validation() {
        let user = SessionUser {
            id: "user-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image: None,
            email_verified: false,
        };
        let token = encode_session_token("secret", &user, -120).unwrap();

        let result = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}

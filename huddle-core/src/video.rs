//! Video vendor adapter — stateless pass-through to the hosted video API.
//!
//! Provides a `VideoService` trait with a production `StreamVideoClient`
//! implementation. The adapter owns no state: it upserts vendor-side user
//! records, provisions call objects keyed by `(call type, meeting id)`, and
//! mints short-lived user session tokens. Failures are surfaced to the caller
//! unchanged; nothing here retries.

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::VideoSettings;

/// Vendor call type used for every meeting.
pub const DEFAULT_CALL_TYPE: &str = "default";

/// Seconds the user token `iat` is backdated to absorb clock skew.
const TOKEN_IAT_LEEWAY_SECS: i64 = 60;

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vendor API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Stream credentials are missing")]
    MissingCredentials,

    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

// ============================================================================
// Config
// ============================================================================

/// Resolved vendor credentials and endpoint.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub token_ttl_seconds: u64,
}

impl VideoConfig {
    /// Build from the config-file section, falling back to the
    /// STREAM_API_KEY / STREAM_API_SECRET environment variables.
    /// Missing credentials are fatal — there is no degraded mode.
    pub fn from_settings(settings: &VideoSettings) -> Result<Self, VideoError> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("STREAM_API_KEY").ok())
            .filter(|s| !s.is_empty())
            .ok_or(VideoError::MissingCredentials)?;
        let api_secret = settings
            .api_secret
            .clone()
            .or_else(|| std::env::var("STREAM_API_SECRET").ok())
            .filter(|s| !s.is_empty())
            .ok_or(VideoError::MissingCredentials)?;

        Ok(Self {
            api_key,
            api_secret,
            base_url: settings.base_url.clone(),
            token_ttl_seconds: settings.token_ttl_seconds,
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Vendor-side user record. Upserts are idempotent: repeating the same
/// payload leaves vendor state unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorUser {
    pub id: String,
    pub name: String,
    pub role: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionSettings {
    pub language: String,
    pub mode: String,
    pub closed_caption_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingSettings {
    pub mode: String,
    pub quality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallSettingsOverride {
    pub transcription: TranscriptionSettings,
    pub recording: RecordingSettings,
}

impl Default for CallSettingsOverride {
    /// Auto-on English transcription with captions, auto-on 1080p recording.
    fn default() -> Self {
        Self {
            transcription: TranscriptionSettings {
                language: "en".to_string(),
                mode: "auto-on".to_string(),
                closed_caption_mode: "auto-on".to_string(),
            },
            recording: RecordingSettings {
                mode: "auto-on".to_string(),
                quality: "1080p".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallCustomData {
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    #[serde(rename = "meetingName")]
    pub meeting_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRequest {
    pub created_by_id: String,
    pub custom: CallCustomData,
    pub settings_override: CallSettingsOverride,
}

/// Claims carried in a user session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokenClaims {
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
struct ServerTokenClaims {
    server: bool,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize)]
struct UpsertUsersRequest<'a> {
    users: std::collections::BTreeMap<&'a str, &'a VendorUser>,
}

#[derive(Debug, Serialize)]
struct CreateCallRequest<'a> {
    data: &'a CallRequest,
}

// ============================================================================
// VideoService trait
// ============================================================================

/// Abstraction over the video vendor, mockable in tests.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Create-or-update vendor user records. Idempotent.
    async fn upsert_users(&self, users: &[VendorUser]) -> Result<(), VideoError>;

    /// Create the call object if absent, fetch it otherwise.
    async fn get_or_create_call(
        &self,
        call_type: &str,
        call_id: &str,
        request: &CallRequest,
    ) -> Result<(), VideoError>;

    /// Mint a short-lived session token scoped to one user.
    fn generate_user_token(&self, user_id: &str) -> Result<String, VideoError>;

    /// Adapter name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// StreamVideoClient
// ============================================================================

pub struct StreamVideoClient {
    http: Client,
    config: VideoConfig,
}

impl StreamVideoClient {
    pub fn new(config: VideoConfig) -> Result<Self, VideoError> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(VideoError::MissingCredentials);
        }
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, config })
    }

    /// Test constructor pointing at a mock server.
    pub fn with_base_url(mut config: VideoConfig, base_url: impl Into<String>) -> Result<Self, VideoError> {
        config.base_url = base_url.into();
        Self::new(config)
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.config.api_secret.as_bytes())
    }

    /// Server-to-server auth token for REST calls.
    fn server_token(&self) -> Result<String, VideoError> {
        let now = chrono::Utc::now().timestamp();
        let claims = ServerTokenClaims {
            server: true,
            iat: now,
            exp: now + 300,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key())?)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), VideoError> {
        let url = format!(
            "{}{}?api_key={}",
            self.config.base_url, path, self.config.api_key
        );
        let response = self
            .http
            .post(&url)
            .header("Authorization", self.server_token()?)
            .header("stream-auth-type", "jwt")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Vendor call to {} failed ({}): {}", path, status, message);
            return Err(VideoError::Api {
                code: status.as_u16(),
                message,
            });
        }
        tracing::debug!("Vendor call to {} succeeded", path);
        Ok(())
    }
}

#[async_trait]
impl VideoService for StreamVideoClient {
    async fn upsert_users(&self, users: &[VendorUser]) -> Result<(), VideoError> {
        let body = UpsertUsersRequest {
            users: users.iter().map(|u| (u.id.as_str(), u)).collect(),
        };
        self.post_json("/users", &body).await
    }

    async fn get_or_create_call(
        &self,
        call_type: &str,
        call_id: &str,
        request: &CallRequest,
    ) -> Result<(), VideoError> {
        let path = format!("/video/call/{call_type}/{call_id}");
        self.post_json(&path, &CreateCallRequest { data: request }).await
    }

    fn generate_user_token(&self, user_id: &str) -> Result<String, VideoError> {
        let now = chrono::Utc::now().timestamp();
        let claims = UserTokenClaims {
            user_id: user_id.to_string(),
            iat: now - TOKEN_IAT_LEEWAY_SECS,
            exp: now + self.config.token_ttl_seconds as i64,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key())?)
    }

    fn name(&self) -> &str {
        "stream"
    }
}

// ============================================================================
// Avatars
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum AvatarVariant {
    Initials,
    BotttsNeutral,
}

impl AvatarVariant {
    fn as_str(&self) -> &'static str {
        match self {
            AvatarVariant::Initials => "initials",
            AvatarVariant::BotttsNeutral => "botttsNeutral",
        }
    }
}

/// Deterministic avatar for users without an image. Same seed, same picture.
pub fn avatar_uri(seed: &str, variant: AvatarVariant) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(seed.as_bytes()).collect();
    format!(
        "https://api.dicebear.com/9.x/{}/svg?seed={}",
        variant.as_str(),
        encoded
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> VideoConfig {
        VideoConfig {
            api_key: "test-key".to_string(),
            api_secret: "test-secret".to_string(),
            base_url: "http://unused.invalid".to_string(),
            token_ttl_seconds: 3600,
        }
    }

    fn sample_user() -> VendorUser {
        VendorUser {
            id: "user-1".to_string(),
            name: "Ada".to_string(),
            role: "admin".to_string(),
            image: avatar_uri("Ada", AvatarVariant::Initials),
        }
    }

    #[test]
    fn missing_credentials_is_a_constructor_error() {
        let settings = VideoSettings::default();
        std::env::remove_var("STREAM_API_KEY");
        std::env::remove_var("STREAM_API_SECRET");
        let result = VideoConfig::from_settings(&settings);
        assert!(matches!(result, Err(VideoError::MissingCredentials)));
    }

    #[test]
    fn user_token_carries_backdated_iat_and_ttl_expiry() {
        let client = StreamVideoClient::new(test_config()).unwrap();
        let token = client.generate_user_token("user-42").unwrap();

        let decoded = decode::<UserTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        let claims = decoded.claims;
        assert_eq!(claims.user_id, "user-42");
        let now = chrono::Utc::now().timestamp();
        assert!(claims.iat <= now - TOKEN_IAT_LEEWAY_SECS + 5);
        assert_eq!(claims.exp - claims.iat, 3600 + TOKEN_IAT_LEEWAY_SECS);
    }

    #[test]
    fn avatar_uri_encodes_seed() {
        let uri = avatar_uri("Math Tutor", AvatarVariant::BotttsNeutral);
        assert_eq!(
            uri,
            "https://api.dicebear.com/9.x/botttsNeutral/svg?seed=Math+Tutor"
        );
    }

    #[tokio::test]
    async fn upsert_users_posts_keyed_payload() {
        let mock_server = MockServer::start().await;
        let client =
            StreamVideoClient::with_base_url(test_config(), mock_server.uri()).unwrap();
        let user = sample_user();

        Mock::given(method("POST"))
            .and(path("/users"))
            .and(query_param("api_key", "test-key"))
            .and(header("stream-auth-type", "jwt"))
            .and(body_json(serde_json::json!({
                "users": {
                    "user-1": {
                        "id": "user-1",
                        "name": "Ada",
                        "role": "admin",
                        "image": user.image.clone(),
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.upsert_users(&[user]).await;
        assert!(result.is_ok(), "Expected Ok, got {:?}", result.err());
    }

    #[tokio::test]
    async fn upsert_users_twice_with_same_payload_succeeds_both_times() {
        let mock_server = MockServer::start().await;
        let client =
            StreamVideoClient::with_base_url(test_config(), mock_server.uri()).unwrap();
        let user = sample_user();

        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(2)
            .mount(&mock_server)
            .await;

        client.upsert_users(std::slice::from_ref(&user)).await.unwrap();
        client.upsert_users(std::slice::from_ref(&user)).await.unwrap();
    }

    #[tokio::test]
    async fn create_call_sends_auto_on_settings_override() {
        let mock_server = MockServer::start().await;
        let client =
            StreamVideoClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        let request = CallRequest {
            created_by_id: "user-1".to_string(),
            custom: CallCustomData {
                meeting_id: "meeting-1".to_string(),
                meeting_name: "Sync".to_string(),
            },
            settings_override: CallSettingsOverride::default(),
        };

        Mock::given(method("POST"))
            .and(path("/video/call/default/meeting-1"))
            .and(body_json(serde_json::json!({
                "data": {
                    "created_by_id": "user-1",
                    "custom": { "meetingId": "meeting-1", "meetingName": "Sync" },
                    "settings_override": {
                        "transcription": {
                            "language": "en",
                            "mode": "auto-on",
                            "closed_caption_mode": "auto-on"
                        },
                        "recording": { "mode": "auto-on", "quality": "1080p" }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let result = client
            .get_or_create_call(DEFAULT_CALL_TYPE, "meeting-1", &request)
            .await;
        assert!(result.is_ok(), "Expected Ok, got {:?}", result.err());
    }

    #[tokio::test]
    async fn vendor_500_maps_to_api_error() {
        let mock_server = MockServer::start().await;
        let client =
            StreamVideoClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let result = client.upsert_users(&[sample_user()]).await;
        match result {
            Err(VideoError::Api { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}

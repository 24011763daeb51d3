use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user as supplied by the hosted auth provider. The provider
/// owns the user table; this is only the session-scoped view of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// When the provider last refreshed this session (token issue time).
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub session: SessionMeta,
}

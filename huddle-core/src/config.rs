use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct HuddleConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8780,
        }
    }
}

/// Bounds for list-endpoint paging. Requested page sizes outside
/// [min_page_size, max_page_size] are silently clamped.
#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub min_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            min_page_size: 1,
            max_page_size: 100,
        }
    }
}

/// Video vendor settings as they appear in huddle.toml. Credentials may be
/// omitted from the file and supplied via STREAM_API_KEY / STREAM_API_SECRET.
#[derive(Debug, Deserialize, Clone)]
pub struct VideoSettings {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    #[serde(default = "default_video_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

fn default_video_base_url() -> String {
    "https://video.stream-io-api.com".to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: default_video_base_url(),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

/// Auth provider boundary. The hosted provider signs session JWTs with a
/// shared secret; HUDDLE_SESSION_SECRET overrides the file value.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    pub session_secret: Option<String>,
}

impl AuthConfig {
    pub fn resolve_secret(&self) -> Option<String> {
        std::env::var("HUDDLE_SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.session_secret.clone())
    }
}

impl HuddleConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_are_sane() {
        let p = PaginationConfig::default();
        assert!(p.min_page_size <= p.default_page_size);
        assert!(p.default_page_size <= p.max_page_size);
    }

    #[test]
    fn video_settings_default_ttl_is_one_hour() {
        let v = VideoSettings::default();
        assert_eq!(v.token_ttl_seconds, 3600);
        assert!(v.api_key.is_none());
    }
}

//! Input-shape contracts for agent and meeting requests.
//!
//! Every request body is validated here before it reaches the store; a
//! failure collects per-field messages so forms can render them inline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::models::MeetingStatus;

pub const MIN_AGENT_NAME_LEN: usize = 3;
pub const MIN_AGENT_INSTRUCTIONS_LEN: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msgs: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// Agent inputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentInput {
    pub name: String,
    pub instructions: String,
}

impl CreateAgentInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.chars().count() < MIN_AGENT_NAME_LEN {
            errors.push("name", "Name must be at least 3 characters");
        }
        if self.instructions.chars().count() < MIN_AGENT_INSTRUCTIONS_LEN {
            errors.push("instructions", "Instructions must be at least 5 characters");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentInput {
    pub name: Option<String>,
    pub instructions: Option<String>,
}

impl UpdateAgentInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            if name.chars().count() < MIN_AGENT_NAME_LEN {
                errors.push("name", "Name must be at least 3 characters");
            }
        }
        if let Some(instructions) = &self.instructions {
            if instructions.chars().count() < MIN_AGENT_INSTRUCTIONS_LEN {
                errors.push("instructions", "Instructions must be at least 5 characters");
            }
        }
        errors.into_result()
    }
}

// ============================================================================
// Meeting inputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingInput {
    pub name: String,
    pub agent_id: Uuid,
}

impl CreateMeetingInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Meeting name is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingInput {
    pub name: Option<String>,
    pub agent_id: Option<Uuid>,
    pub status: Option<MeetingStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub transcript_url: Option<String>,
    pub recording_url: Option<String>,
}

impl UpdateMeetingInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("name", "Meeting name is required");
            }
        }
        // Empty string clears the URL; anything else must parse.
        for (field, value) in [
            ("transcriptUrl", &self.transcript_url),
            ("recordingUrl", &self.recording_url),
        ] {
            if let Some(raw) = value {
                if !raw.is_empty() && url::Url::parse(raw).is_err() {
                    errors.push(field, format!("{field} must be a valid URL"));
                }
            }
        }
        errors.into_result()
    }
}

// ============================================================================
// List parameters
// ============================================================================

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    #[serde(default)]
    pub all: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: None,
            search: None,
            all: false,
        }
    }
}

impl ListParams {
    /// Requested size clamped to the configured window; absent means default.
    pub fn effective_page_size(&self, cfg: &PaginationConfig) -> u32 {
        self.page_size
            .unwrap_or(cfg.default_page_size)
            .clamp(cfg.min_page_size, cfg.max_page_size)
    }

    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn offset(&self, cfg: &PaginationConfig) -> i64 {
        i64::from(self.effective_page() - 1) * i64::from(self.effective_page_size(cfg))
    }

    /// Substring filter, dropped when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_agent_rejects_short_name() {
        let input = CreateAgentInput {
            name: "ab".to_string(),
            instructions: "be helpful".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0[0].field, "name");
        assert_eq!(errors.0[0].message, "Name must be at least 3 characters");
    }

    #[test]
    fn create_agent_rejects_short_instructions() {
        let input = CreateAgentInput {
            name: "Tutor".to_string(),
            instructions: "hi".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0[0].field, "instructions");
    }

    #[test]
    fn create_agent_collects_both_field_errors() {
        let input = CreateAgentInput {
            name: "a".to_string(),
            instructions: "b".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0.len(), 2);
    }

    #[test]
    fn create_agent_accepts_minimum_lengths() {
        let input = CreateAgentInput {
            name: "abc".to_string(),
            instructions: "12345".to_string(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn update_agent_skips_absent_fields() {
        assert!(UpdateAgentInput::default().validate().is_ok());
    }

    #[test]
    fn create_meeting_requires_name() {
        let input = CreateMeetingInput {
            name: "   ".to_string(),
            agent_id: Uuid::new_v4(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0[0].message, "Meeting name is required");
    }

    #[test]
    fn update_meeting_rejects_bad_url_but_allows_empty() {
        let input = UpdateMeetingInput {
            recording_url: Some("not a url".to_string()),
            transcript_url: Some(String::new()),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0[0].field, "recordingUrl");
    }

    #[test]
    fn page_size_clamped_to_configured_bounds() {
        let cfg = PaginationConfig::default();
        let mut params = ListParams {
            page_size: Some(10_000),
            ..Default::default()
        };
        assert_eq!(params.effective_page_size(&cfg), cfg.max_page_size);

        params.page_size = Some(0);
        assert_eq!(params.effective_page_size(&cfg), cfg.min_page_size);

        params.page_size = None;
        assert_eq!(params.effective_page_size(&cfg), cfg.default_page_size);
    }

    #[test]
    fn page_zero_treated_as_first_page() {
        let cfg = PaginationConfig::default();
        let params = ListParams {
            page: 0,
            ..Default::default()
        };
        assert_eq!(params.effective_page(), 1);
        assert_eq!(params.offset(&cfg), 0);
    }

    #[test]
    fn blank_search_is_dropped() {
        let params = ListParams {
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_term(), None);
    }
}

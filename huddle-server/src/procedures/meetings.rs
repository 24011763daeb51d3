use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use huddle_core::config::PaginationConfig;
use huddle_core::lifecycle::{self, CallEvent, LifecycleAction};
use huddle_core::models::{Meeting, MeetingListItem, MeetingStatus, Page, SessionUser};
use huddle_core::schema::{CreateMeetingInput, ListParams, UpdateMeetingInput};
use huddle_core::store;
use huddle_core::video::{
    avatar_uri, AvatarVariant, CallCustomData, CallRequest, CallSettingsOverride, VendorUser,
    VideoService, DEFAULT_CALL_TYPE,
};

use super::ProcedureError;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Outcome of the pre-join guard. A refused join carries the user-facing
/// message and the redirect back to the meeting list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub allowed: bool,
    pub status: MeetingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

/// Result of applying an observed call event to the persisted status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status: MeetingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<LifecycleAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

fn owner_vendor_user(user: &SessionUser) -> VendorUser {
    VendorUser {
        id: user.id.clone(),
        name: user.name.clone(),
        role: "admin".to_string(),
        image: user
            .image
            .clone()
            .unwrap_or_else(|| avatar_uri(&user.name, AvatarVariant::Initials)),
    }
}

pub async fn get_many(
    pool: &PgPool,
    cfg: &PaginationConfig,
    user: &SessionUser,
    params: ListParams,
) -> Result<Page<MeetingListItem>, ProcedureError> {
    Ok(store::meetings::list(pool, &user.id, &params, cfg).await?)
}

pub async fn get_one(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<Meeting, ProcedureError> {
    store::meetings::get(pool, &user.id, id)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Meeting not found"))
}

/// Create a meeting and provision its vendor-side call: a `default`-type call
/// keyed by the meeting id with auto-on transcription and recording, plus
/// vendor user records for the owner (admin) and the agent (participant).
pub async fn create(
    pool: &PgPool,
    video: &dyn VideoService,
    user: &SessionUser,
    input: CreateMeetingInput,
) -> Result<Meeting, ProcedureError> {
    input.validate()?;

    let agent = store::agents::get(pool, &user.id, input.agent_id)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Agent not found"))?;

    let meeting = store::meetings::insert(pool, &user.id, &input).await?;

    let call_request = CallRequest {
        created_by_id: user.id.clone(),
        custom: CallCustomData {
            meeting_id: meeting.id.to_string(),
            meeting_name: meeting.name.clone(),
        },
        settings_override: CallSettingsOverride::default(),
    };
    video
        .get_or_create_call(DEFAULT_CALL_TYPE, &meeting.id.to_string(), &call_request)
        .await?;

    video
        .upsert_users(&[
            owner_vendor_user(user),
            VendorUser {
                id: agent.id.to_string(),
                name: agent.name.clone(),
                role: "user".to_string(),
                image: avatar_uri(&agent.name, AvatarVariant::BotttsNeutral),
            },
        ])
        .await?;

    tracing::info!(meeting_id = %meeting.id, agent_id = %agent.id, "Meeting created");
    Ok(meeting)
}

pub async fn update(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
    input: UpdateMeetingInput,
) -> Result<Meeting, ProcedureError> {
    input.validate()?;
    store::meetings::update(pool, &user.id, id, &input)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Update failed"))
}

pub async fn remove(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<Meeting, ProcedureError> {
    store::meetings::delete(pool, &user.id, id)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Deletion failed"))
}

/// Upsert the caller's vendor profile and mint a session token for joining
/// calls. The upsert runs on every token request and is idempotent.
pub async fn generate_token(
    video: &dyn VideoService,
    user: &SessionUser,
) -> Result<TokenResponse, ProcedureError> {
    video.upsert_users(&[owner_vendor_user(user)]).await?;
    let token = video.generate_user_token(&user.id)?;
    Ok(TokenResponse { token })
}

/// Pre-join guard: completed (or already ended) and cancelled meetings
/// cannot be joined.
pub async fn join(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<JoinResponse, ProcedureError> {
    let meeting = get_one(pool, user, id).await?;
    Ok(match lifecycle::check_join(meeting.status, meeting.ended_at) {
        Ok(()) => JoinResponse {
            allowed: true,
            status: meeting.status,
            message: None,
            redirect: None,
        },
        Err(rejection) => JoinResponse {
            allowed: false,
            status: meeting.status,
            message: Some(rejection.message()),
            redirect: Some(rejection.redirect()),
        },
    })
}

/// Apply one observed call event. The lifecycle decision may imply a status
/// write (activation stamps `started_at`, completion stamps `ended_at`);
/// anything else is a no-op echoing the current status.
pub async fn apply_event(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
    event: CallEvent,
) -> Result<EventResponse, ProcedureError> {
    let meeting = get_one(pool, user, id).await?;

    let Some(action) = lifecycle::decide(meeting.status, event) else {
        return Ok(EventResponse {
            status: meeting.status,
            action: None,
            redirect: None,
        });
    };

    let patch = UpdateMeetingInput {
        status: Some(action.target_status()),
        ..Default::default()
    };
    let updated = store::meetings::update(pool, &user.id, id, &patch)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Update failed"))?;

    let redirect = matches!(
        action,
        LifecycleAction::MarkCompleted | LifecycleAction::EndCall
    )
    .then(|| format!("/meetings/{}/review", meeting.id));

    tracing::info!(meeting_id = %meeting.id, ?action, status = updated.status.as_str(),
        "Lifecycle event applied");
    Ok(EventResponse {
        status: updated.status,
        action: Some(action),
        redirect,
    })
}

/// Cancel an upcoming meeting without it ever going active.
pub async fn cancel(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<Meeting, ProcedureError> {
    let meeting = get_one(pool, user, id).await?;
    if !lifecycle::can_cancel(meeting.status) {
        return Err(ProcedureError::bad_request(
            "Only upcoming meetings can be cancelled",
        ));
    }

    let patch = UpdateMeetingInput {
        status: Some(MeetingStatus::Cancelled),
        ..Default::default()
    };
    store::meetings::update(pool, &user.id, id, &patch)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Update failed"))
}

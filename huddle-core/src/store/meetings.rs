use sqlx::PgPool;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::models::{page, Meeting, MeetingListItem, Page};
use crate::schema::{CreateMeetingInput, ListParams, UpdateMeetingInput};

const LIST_SQL: &str = "\
    SELECT m.id, m.name, m.agent_id, a.name AS agent_name, m.status, \
           m.started_at, m.ended_at, m.created_at \
    FROM meeting m \
    LEFT JOIN agent a ON a.id = m.agent_id \
    WHERE m.user_id = $1 AND ($2::text IS NULL OR m.name ILIKE '%' || $2 || '%') \
    ORDER BY m.created_at DESC, m.id DESC";

const COUNT_SQL: &str = "\
    SELECT COUNT(*) FROM meeting m \
    WHERE m.user_id = $1 AND ($2::text IS NULL OR m.name ILIKE '%' || $2 || '%')";

pub async fn list(
    pool: &PgPool,
    user_id: &str,
    params: &ListParams,
    cfg: &PaginationConfig,
) -> Result<Page<MeetingListItem>, sqlx::Error> {
    let search = params.search_term();

    if params.all {
        let items = sqlx::query_as::<_, MeetingListItem>(LIST_SQL)
            .bind(user_id)
            .bind(search)
            .fetch_all(pool)
            .await?;
        let total = items.len() as i64;
        return Ok(Page {
            items,
            total,
            total_pages: 1,
        });
    }

    let page_size = i64::from(params.effective_page_size(cfg));
    let items = sqlx::query_as::<_, MeetingListItem>(&format!("{LIST_SQL} LIMIT $3 OFFSET $4"))
        .bind(user_id)
        .bind(search)
        .bind(page_size)
        .bind(params.offset(cfg))
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(COUNT_SQL)
        .bind(user_id)
        .bind(search)
        .fetch_one(pool)
        .await?;

    Ok(Page {
        items,
        total,
        total_pages: page::total_pages(total, page_size),
    })
}

pub async fn get(pool: &PgPool, user_id: &str, id: Uuid) -> Result<Option<Meeting>, sqlx::Error> {
    sqlx::query_as::<_, Meeting>("SELECT * FROM meeting WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    user_id: &str,
    input: &CreateMeetingInput,
) -> Result<Meeting, sqlx::Error> {
    sqlx::query_as::<_, Meeting>(
        "INSERT INTO meeting (name, agent_id, user_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&input.name)
    .bind(input.agent_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Partial update scoped to the owner. Setting status to `active` stamps
/// `started_at`, to `completed` stamps `ended_at`; an empty URL string clears
/// the column. Zero rows matched means absent-or-not-yours.
pub async fn update(
    pool: &PgPool,
    user_id: &str,
    id: Uuid,
    input: &UpdateMeetingInput,
) -> Result<Option<Meeting>, sqlx::Error> {
    sqlx::query_as::<_, Meeting>(
        "UPDATE meeting SET \
             name = COALESCE($3, name), \
             agent_id = COALESCE($4, agent_id), \
             status = COALESCE($5, status), \
             started_at = CASE WHEN $5 = 'active'::meeting_status THEN now() \
                               ELSE COALESCE($6, started_at) END, \
             ended_at = CASE WHEN $5 = 'completed'::meeting_status THEN now() \
                             ELSE COALESCE($7, ended_at) END, \
             summary = COALESCE($8, summary), \
             transcript_url = CASE WHEN $9 = '' THEN NULL \
                                   ELSE COALESCE($9, transcript_url) END, \
             recording_url = CASE WHEN $10 = '' THEN NULL \
                                  ELSE COALESCE($10, recording_url) END, \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.name.as_deref())
    .bind(input.agent_id)
    .bind(input.status)
    .bind(input.started_at)
    .bind(input.ended_at)
    .bind(input.summary.as_deref())
    .bind(input.transcript_url.as_deref())
    .bind(input.recording_url.as_deref())
    .fetch_optional(pool)
    .await
}

pub async fn delete(
    pool: &PgPool,
    user_id: &str,
    id: Uuid,
) -> Result<Option<Meeting>, sqlx::Error> {
    sqlx::query_as::<_, Meeting>("DELETE FROM meeting WHERE id = $1 AND user_id = $2 RETURNING *")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::models::{page, Agent, Page};
use crate::schema::{CreateAgentInput, ListParams, UpdateAgentInput};

const LIST_SQL: &str = "\
    SELECT * FROM agent \
    WHERE user_id = $1 AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%') \
    ORDER BY created_at DESC, id DESC";

const COUNT_SQL: &str = "\
    SELECT COUNT(*) FROM agent \
    WHERE user_id = $1 AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')";

pub async fn list(
    pool: &PgPool,
    user_id: &str,
    params: &ListParams,
    cfg: &PaginationConfig,
) -> Result<Page<Agent>, sqlx::Error> {
    let search = params.search_term();

    if params.all {
        let items = sqlx::query_as::<_, Agent>(LIST_SQL)
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
    let items = sqlx::query_as::<_, Agent>(&format!("{LIST_SQL} LIMIT $3 OFFSET $4"))
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

pub async fn get(pool: &PgPool, user_id: &str, id: Uuid) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agent WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    user_id: &str,
    input: &CreateAgentInput,
) -> Result<Agent, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        "INSERT INTO agent (name, instructions, user_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&input.name)
    .bind(&input.instructions)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    user_id: &str,
    id: Uuid,
    input: &UpdateAgentInput,
) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        "UPDATE agent SET \
             name = COALESCE($3, name), \
             instructions = COALESCE($4, instructions), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.name.as_deref())
    .bind(input.instructions.as_deref())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, user_id: &str, id: Uuid) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>("DELETE FROM agent WHERE id = $1 AND user_id = $2 RETURNING *")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

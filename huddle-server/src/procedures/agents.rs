use sqlx::PgPool;
use uuid::Uuid;

use huddle_core::config::PaginationConfig;
use huddle_core::models::{Agent, Page, SessionUser};
use huddle_core::schema::{CreateAgentInput, ListParams, UpdateAgentInput};
use huddle_core::store;

use super::ProcedureError;

pub async fn get_many(
    pool: &PgPool,
    cfg: &PaginationConfig,
    user: &SessionUser,
    params: ListParams,
) -> Result<Page<Agent>, ProcedureError> {
    Ok(store::agents::list(pool, &user.id, &params, cfg).await?)
}

pub async fn get_one(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<Agent, ProcedureError> {
    store::agents::get(pool, &user.id, id)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Agent not found"))
}

pub async fn create(
    pool: &PgPool,
    user: &SessionUser,
    input: CreateAgentInput,
) -> Result<Agent, ProcedureError> {
    input.validate()?;
    let agent = store::agents::insert(pool, &user.id, &input).await?;
    tracing::info!(agent_id = %agent.id, "Agent created");
    Ok(agent)
}

pub async fn update(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
    input: UpdateAgentInput,
) -> Result<Agent, ProcedureError> {
    input.validate()?;
    store::agents::update(pool, &user.id, id, &input)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Agent not found"))
}

pub async fn remove(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
) -> Result<Agent, ProcedureError> {
    store::agents::delete(pool, &user.id, id)
        .await?
        .ok_or_else(|| ProcedureError::not_found("Agent not found"))
}

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Questao, QuestaoOpcao};

const QUESTAO_COLUMNS: &str = "id, prova_id, \"order\", text, created_at";
const OPCAO_COLUMNS: &str = "id, questao_id, \"order\", text, is_correct, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Questao>, sqlx::Error> {
    sqlx::query_as::<_, Questao>(&format!(
        "SELECT {QUESTAO_COLUMNS} FROM questoes WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_prova(
    pool: &PgPool,
    prova_id: &str,
) -> Result<Vec<Questao>, sqlx::Error> {
    sqlx::query_as::<_, Questao>(&format!(
        "SELECT {QUESTAO_COLUMNS} FROM questoes WHERE prova_id = $1 ORDER BY \"order\"",
    ))
    .bind(prova_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_order(
    pool: &PgPool,
    prova_id: &str,
    order: i32,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM questoes WHERE prova_id = $1 AND \"order\" = $2")
            .bind(prova_id)
            .bind(order)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub(crate) struct CreateQuestao<'a> {
    pub id: &'a str,
    pub prova_id: &'a str,
    pub order: i32,
    pub text: &'a str,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestao<'_>,
) -> Result<Questao, sqlx::Error> {
    sqlx::query_as::<_, Questao>(&format!(
        "INSERT INTO questoes (id, prova_id, \"order\", text, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {QUESTAO_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.prova_id)
    .bind(params.order)
    .bind(params.text)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    order: Option<i32>,
    text: Option<&str>,
) -> Result<Questao, sqlx::Error> {
    sqlx::query_as::<_, Questao>(&format!(
        "UPDATE questoes SET
            \"order\" = COALESCE($1, \"order\"),
            text = COALESCE($2, text)
         WHERE id = $3
         RETURNING {QUESTAO_COLUMNS}",
    ))
    .bind(order)
    .bind(text)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questoes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_opcao_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuestaoOpcao>, sqlx::Error> {
    sqlx::query_as::<_, QuestaoOpcao>(&format!(
        "SELECT {OPCAO_COLUMNS} FROM questao_opcoes WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_opcoes_by_questao(
    pool: &PgPool,
    questao_id: &str,
) -> Result<Vec<QuestaoOpcao>, sqlx::Error> {
    sqlx::query_as::<_, QuestaoOpcao>(&format!(
        "SELECT {OPCAO_COLUMNS} FROM questao_opcoes WHERE questao_id = $1 ORDER BY \"order\"",
    ))
    .bind(questao_id)
    .fetch_all(pool)
    .await
}

/// Batch load for assembling a whole prova in one round trip.
pub(crate) async fn list_opcoes_by_questao_ids(
    pool: &PgPool,
    questao_ids: &[String],
) -> Result<Vec<QuestaoOpcao>, sqlx::Error> {
    sqlx::query_as::<_, QuestaoOpcao>(&format!(
        "SELECT {OPCAO_COLUMNS} FROM questao_opcoes
         WHERE questao_id = ANY($1)
         ORDER BY questao_id, \"order\"",
    ))
    .bind(questao_ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateOpcao<'a> {
    pub id: &'a str,
    pub questao_id: &'a str,
    pub order: i32,
    pub text: &'a str,
    pub is_correct: bool,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create_opcao(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateOpcao<'_>,
) -> Result<QuestaoOpcao, sqlx::Error> {
    sqlx::query_as::<_, QuestaoOpcao>(&format!(
        "INSERT INTO questao_opcoes (id, questao_id, \"order\", text, is_correct, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {OPCAO_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.questao_id)
    .bind(params.order)
    .bind(params.text)
    .bind(params.is_correct)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update_opcao(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    order: Option<i32>,
    text: Option<&str>,
    is_correct: Option<bool>,
) -> Result<QuestaoOpcao, sqlx::Error> {
    sqlx::query_as::<_, QuestaoOpcao>(&format!(
        "UPDATE questao_opcoes SET
            \"order\" = COALESCE($1, \"order\"),
            text = COALESCE($2, text),
            is_correct = COALESCE($3, is_correct)
         WHERE id = $4
         RETURNING {OPCAO_COLUMNS}",
    ))
    .bind(order)
    .bind(text)
    .bind(is_correct)
    .bind(id)
    .fetch_one(executor)
    .await
}

/// Clears the correct flag on every other choice of the same questão so a
/// promotion leaves exactly one choice marked.
pub(crate) async fn demote_sibling_opcoes(
    executor: impl sqlx::PgExecutor<'_>,
    questao_id: &str,
    keep_opcao_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE questao_opcoes SET is_correct = FALSE WHERE questao_id = $1 AND id <> $2",
    )
    .bind(questao_id)
    .bind(keep_opcao_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_opcao_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM questao_opcoes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::PgPool;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{AlunoRandomizacao, TurmaProva};

const LINK_COLUMNS: &str = "id, turma_id, prova_id, created_at";
const RAND_COLUMNS: &str =
    "id, turma_prova_id, aluno_id, questoes_order, alternativas_order, created_at";

pub(crate) async fn find_link_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TurmaProva>, sqlx::Error> {
    sqlx::query_as::<_, TurmaProva>(&format!(
        "SELECT {LINK_COLUMNS} FROM turma_provas WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_link_by_pair(
    pool: &PgPool,
    turma_id: &str,
    prova_id: &str,
) -> Result<Option<TurmaProva>, sqlx::Error> {
    sqlx::query_as::<_, TurmaProva>(&format!(
        "SELECT {LINK_COLUMNS} FROM turma_provas WHERE turma_id = $1 AND prova_id = $2",
    ))
    .bind(turma_id)
    .bind(prova_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn create_link(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    turma_id: &str,
    prova_id: &str,
    created_at: PrimitiveDateTime,
) -> Result<TurmaProva, sqlx::Error> {
    sqlx::query_as::<_, TurmaProva>(&format!(
        "INSERT INTO turma_provas (id, turma_id, prova_id, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {LINK_COLUMNS}",
    ))
    .bind(id)
    .bind(turma_id)
    .bind(prova_id)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

/// Removes the link; stored permutations go with it through the cascade.
pub(crate) async fn delete_link_by_pair(
    pool: &PgPool,
    turma_id: &str,
    prova_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM turma_provas WHERE turma_id = $1 AND prova_id = $2")
        .bind(turma_id)
        .bind(prova_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_links(
    pool: &PgPool,
    turma_id: Option<&str>,
    prova_id: Option<&str>,
) -> Result<Vec<TurmaProva>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {LINK_COLUMNS} FROM turma_provas WHERE TRUE"));

    if let Some(turma_id) = turma_id {
        builder.push(" AND turma_id = ");
        builder.push_bind(turma_id);
    }
    if let Some(prova_id) = prova_id {
        builder.push(" AND prova_id = ");
        builder.push_bind(prova_id);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<TurmaProva>().fetch_all(pool).await
}

pub(crate) async fn linked_prova_ids_for_turma(
    pool: &PgPool,
    turma_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT prova_id FROM turma_provas WHERE turma_id = $1")
        .bind(turma_id)
        .fetch_all(pool)
        .await
}

pub(crate) async fn linked_turma_ids_for_prova(
    pool: &PgPool,
    prova_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT turma_id FROM turma_provas WHERE prova_id = $1")
        .bind(prova_id)
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateRandomizacao<'a> {
    pub id: &'a str,
    pub turma_prova_id: &'a str,
    pub aluno_id: &'a str,
    pub questoes_order: Json<Vec<usize>>,
    pub alternativas_order: Json<HashMap<String, Vec<usize>>>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateRandomizacao<'_>,
) -> Result<AlunoRandomizacao, sqlx::Error> {
    sqlx::query_as::<_, AlunoRandomizacao>(&format!(
        "INSERT INTO aluno_randomizacoes
            (id, turma_prova_id, aluno_id, questoes_order, alternativas_order, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {RAND_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.turma_prova_id)
    .bind(params.aluno_id)
    .bind(params.questoes_order)
    .bind(params.alternativas_order)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_turma_prova(
    pool: &PgPool,
    turma_prova_id: &str,
) -> Result<Vec<AlunoRandomizacao>, sqlx::Error> {
    sqlx::query_as::<_, AlunoRandomizacao>(&format!(
        "SELECT {RAND_COLUMNS} FROM aluno_randomizacoes WHERE turma_prova_id = $1",
    ))
    .bind(turma_prova_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_aluno_and_prova(
    pool: &PgPool,
    aluno_id: &str,
    prova_id: &str,
) -> Result<Option<AlunoRandomizacao>, sqlx::Error> {
    sqlx::query_as::<_, AlunoRandomizacao>(
        "SELECT ar.id, ar.turma_prova_id, ar.aluno_id,
                ar.questoes_order, ar.alternativas_order, ar.created_at
         FROM aluno_randomizacoes ar
         JOIN turma_provas tp ON tp.id = ar.turma_prova_id
         WHERE ar.aluno_id = $1 AND tp.prova_id = $2",
    )
    .bind(aluno_id)
    .bind(prova_id)
    .fetch_optional(pool)
    .await
}

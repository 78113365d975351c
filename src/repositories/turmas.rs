use sqlx::PgPool;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Turma;

const COLUMNS: &str = "id, ano, materia, curso, periodo, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Turma>, sqlx::Error> {
    sqlx::query_as::<_, Turma>(&format!("SELECT {COLUMNS} FROM turmas WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateTurma<'a> {
    pub id: &'a str,
    pub ano: i32,
    pub materia: &'a str,
    pub curso: &'a str,
    pub periodo: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTurma<'_>) -> Result<Turma, sqlx::Error> {
    sqlx::query_as::<_, Turma>(&format!(
        "INSERT INTO turmas (id, ano, materia, curso, periodo, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.ano)
    .bind(params.materia)
    .bind(params.curso)
    .bind(params.periodo)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateTurma {
    pub ano: Option<i32>,
    pub materia: Option<String>,
    pub curso: Option<String>,
    pub periodo: Option<i32>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateTurma,
) -> Result<Turma, sqlx::Error> {
    sqlx::query_as::<_, Turma>(&format!(
        "UPDATE turmas SET
            ano = COALESCE($1, ano),
            materia = COALESCE($2, materia),
            curso = COALESCE($3, curso),
            periodo = COALESCE($4, periodo),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.ano)
    .bind(params.materia)
    .bind(params.curso)
    .bind(params.periodo)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM turmas WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list(
    pool: &PgPool,
    ano: Option<i32>,
    materia: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Turma>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM turmas WHERE TRUE"));

    if let Some(ano) = ano {
        builder.push(" AND ano = ");
        builder.push_bind(ano);
    }
    if let Some(materia) = materia {
        builder.push(" AND materia ILIKE ");
        builder.push_bind(format!("%{materia}%"));
    }

    builder.push(" ORDER BY ano DESC, materia OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Turma>().fetch_all(pool).await
}

/// Unpaginated listing for the link-picker split screens.
pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Turma>, sqlx::Error> {
    sqlx::query_as::<_, Turma>(&format!(
        "SELECT {COLUMNS} FROM turmas ORDER BY ano DESC, materia",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(
    pool: &PgPool,
    ano: Option<i32>,
    materia: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM turmas WHERE TRUE");

    if let Some(ano) = ano {
        builder.push(" AND ano = ");
        builder.push_bind(ano);
    }
    if let Some(materia) = materia {
        builder.push(" AND materia ILIKE ");
        builder.push_bind(format!("%{materia}%"));
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

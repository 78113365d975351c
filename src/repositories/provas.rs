use sqlx::PgPool;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Prova;

const COLUMNS: &str = "id, name, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Prova>, sqlx::Error> {
    sqlx::query_as::<_, Prova>(&format!("SELECT {COLUMNS} FROM provas WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateProva<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub created_by: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateProva<'_>,
) -> Result<Prova, sqlx::Error> {
    sqlx::query_as::<_, Prova>(&format!(
        "INSERT INTO provas (id, name, created_by, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn rename(
    pool: &PgPool,
    id: &str,
    name: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Prova, sqlx::Error> {
    sqlx::query_as::<_, Prova>(&format!(
        "UPDATE provas SET name = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}",
    ))
    .bind(name)
    .bind(updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM provas WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Prova>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM provas WHERE TRUE"));

    if let Some(search) = search {
        builder.push(" AND name ILIKE ");
        builder.push_bind(format!("%{search}%"));
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Prova>().fetch_all(pool).await
}

/// Unpaginated listing for the link-picker split screens.
pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Prova>, sqlx::Error> {
    sqlx::query_as::<_, Prova>(&format!("SELECT {COLUMNS} FROM provas ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM provas WHERE TRUE");

    if let Some(search) = search {
        builder.push(" AND name ILIKE ");
        builder.push_bind(format!("%{search}%"));
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Number of turma links currently holding this prova. Structural edits are
/// refused while this is nonzero.
pub(crate) async fn count_links_by_prova(pool: &PgPool, prova_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM turma_provas WHERE prova_id = $1")
        .bind(prova_id)
        .fetch_one(pool)
        .await
}

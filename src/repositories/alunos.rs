use sqlx::PgPool;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Aluno;

const COLUMNS: &str = "id, nome, email, matricula, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Aluno>, sqlx::Error> {
    sqlx::query_as::<_, Aluno>(&format!("SELECT {COLUMNS} FROM alunos WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM alunos WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_matricula(
    pool: &PgPool,
    matricula: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM alunos WHERE matricula = $1")
        .bind(matricula)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAluno<'a> {
    pub id: &'a str,
    pub nome: &'a str,
    pub email: &'a str,
    pub matricula: &'a str,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateAluno<'_>) -> Result<Aluno, sqlx::Error> {
    sqlx::query_as::<_, Aluno>(&format!(
        "INSERT INTO alunos (id, nome, email, matricula, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.nome)
    .bind(params.email)
    .bind(params.matricula)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateAluno {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub matricula: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAluno,
) -> Result<Aluno, sqlx::Error> {
    sqlx::query_as::<_, Aluno>(&format!(
        "UPDATE alunos SET
            nome = COALESCE($1, nome),
            email = COALESCE($2, email),
            matricula = COALESCE($3, matricula),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.nome)
    .bind(params.email)
    .bind(params.matricula)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM alunos WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Aluno>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM alunos WHERE TRUE"));

    if let Some(search) = search {
        let pattern = format!("%{search}%");
        builder.push(" AND (nome ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR matricula ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY nome OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Aluno>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM alunos WHERE TRUE");

    if let Some(search) = search {
        let pattern = format!("%{search}%");
        builder.push(" AND (nome ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR matricula ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_by_turma(
    pool: &PgPool,
    turma_id: &str,
) -> Result<Vec<Aluno>, sqlx::Error> {
    sqlx::query_as::<_, Aluno>(&format!(
        "SELECT a.id, a.nome, a.email, a.matricula, a.created_at, a.updated_at
         FROM alunos a
         JOIN turma_alunos ta ON ta.aluno_id = a.id
         WHERE ta.turma_id = $1
         ORDER BY a.nome",
    ))
    .bind(turma_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn is_enrolled(
    pool: &PgPool,
    turma_id: &str,
    aluno_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM turma_alunos WHERE turma_id = $1 AND aluno_id = $2",
    )
    .bind(turma_id)
    .bind(aluno_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub(crate) async fn enroll(
    pool: &PgPool,
    turma_id: &str,
    aluno_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO turma_alunos (turma_id, aluno_id) VALUES ($1, $2)")
        .bind(turma_id)
        .bind(aluno_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn unenroll(
    pool: &PgPool,
    turma_id: &str,
    aluno_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM turma_alunos WHERE turma_id = $1 AND aluno_id = $2")
        .bind(turma_id)
        .bind(aluno_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

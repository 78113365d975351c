use sqlx::PgPool;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Correcao, CorrecaoResposta};

const CORRECAO_COLUMNS: &str = "id, aluno_id, turma_id, prova_id, corrigido_por, data_correcao, \
                                nota, total_questoes, acertos";
const RESPOSTA_COLUMNS: &str =
    "id, correcao_id, questao_numero, resposta_marcada, resposta_correta, esta_correta";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Correcao>, sqlx::Error> {
    sqlx::query_as::<_, Correcao>(&format!(
        "SELECT {CORRECAO_COLUMNS} FROM correcoes WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateCorrecao<'a> {
    pub id: &'a str,
    pub aluno_id: &'a str,
    pub turma_id: &'a str,
    pub prova_id: &'a str,
    pub corrigido_por: Option<&'a str>,
    pub data_correcao: PrimitiveDateTime,
    pub nota: f64,
    pub total_questoes: i32,
    pub acertos: i32,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateCorrecao<'_>,
) -> Result<Correcao, sqlx::Error> {
    sqlx::query_as::<_, Correcao>(&format!(
        "INSERT INTO correcoes
            (id, aluno_id, turma_id, prova_id, corrigido_por, data_correcao,
             nota, total_questoes, acertos)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {CORRECAO_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.aluno_id)
    .bind(params.turma_id)
    .bind(params.prova_id)
    .bind(params.corrigido_por)
    .bind(params.data_correcao)
    .bind(params.nota)
    .bind(params.total_questoes)
    .bind(params.acertos)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateResposta<'a> {
    pub id: &'a str,
    pub correcao_id: &'a str,
    pub questao_numero: i32,
    pub resposta_marcada: Option<&'a str>,
    pub resposta_correta: Option<&'a str>,
    pub esta_correta: Option<bool>,
}

pub(crate) async fn create_resposta(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResposta<'_>,
) -> Result<CorrecaoResposta, sqlx::Error> {
    sqlx::query_as::<_, CorrecaoResposta>(&format!(
        "INSERT INTO correcao_respostas
            (id, correcao_id, questao_numero, resposta_marcada, resposta_correta, esta_correta)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {RESPOSTA_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.correcao_id)
    .bind(params.questao_numero)
    .bind(params.resposta_marcada)
    .bind(params.resposta_correta)
    .bind(params.esta_correta)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    aluno_id: Option<&str>,
    turma_id: Option<&str>,
    prova_id: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Correcao>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {CORRECAO_COLUMNS} FROM correcoes WHERE TRUE",
    ));

    if let Some(aluno_id) = aluno_id {
        builder.push(" AND aluno_id = ");
        builder.push_bind(aluno_id);
    }
    if let Some(turma_id) = turma_id {
        builder.push(" AND turma_id = ");
        builder.push_bind(turma_id);
    }
    if let Some(prova_id) = prova_id {
        builder.push(" AND prova_id = ");
        builder.push_bind(prova_id);
    }

    builder.push(" ORDER BY data_correcao DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Correcao>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    aluno_id: Option<&str>,
    turma_id: Option<&str>,
    prova_id: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM correcoes WHERE TRUE");

    if let Some(aluno_id) = aluno_id {
        builder.push(" AND aluno_id = ");
        builder.push_bind(aluno_id);
    }
    if let Some(turma_id) = turma_id {
        builder.push(" AND turma_id = ");
        builder.push_bind(turma_id);
    }
    if let Some(prova_id) = prova_id {
        builder.push(" AND prova_id = ");
        builder.push_bind(prova_id);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_respostas_by_correcao(
    pool: &PgPool,
    correcao_id: &str,
) -> Result<Vec<CorrecaoResposta>, sqlx::Error> {
    sqlx::query_as::<_, CorrecaoResposta>(&format!(
        "SELECT {RESPOSTA_COLUMNS} FROM correcao_respostas
         WHERE correcao_id = $1
         ORDER BY questao_numero",
    ))
    .bind(correcao_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM correcoes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

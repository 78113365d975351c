use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{self, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Turma;
use crate::repositories;
use crate::schemas::aluno::AlunoResponse;
use crate::schemas::turma::{TurmaCreate, TurmaDetailResponse, TurmaResponse, TurmaUpdate};
use crate::schemas::MessageResponse;

#[derive(Debug, Deserialize)]
pub(crate) struct ListTurmasQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
    #[serde(default)]
    ano: Option<i32>,
    #[serde(default)]
    materia: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_turmas).post(create_turma))
        .route("/:turma_id", get(get_turma).put(update_turma).delete(delete_turma))
}

async fn create_turma(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<TurmaCreate>,
) -> Result<(StatusCode, Json<TurmaResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let turma = repositories::turmas::create(
        state.db(),
        repositories::turmas::CreateTurma {
            id: &Uuid::new_v4().to_string(),
            ano: payload.ano,
            materia: &payload.materia,
            curso: &payload.curso,
            periodo: payload.periodo,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create turma"))?;

    Ok((StatusCode::CREATED, Json(TurmaResponse::from_db(turma))))
}

async fn list_turmas(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListTurmasQuery>,
) -> Result<Json<PaginatedResponse<TurmaResponse>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let materia = params.materia.as_deref();

    let turmas = repositories::turmas::list(state.db(), params.ano, materia, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list turmas"))?;
    let total_count = repositories::turmas::count(state.db(), params.ano, materia)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count turmas"))?;

    let items = turmas.into_iter().map(TurmaResponse::from_db).collect();
    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

async fn get_turma(
    Path(turma_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TurmaDetailResponse>, ApiError> {
    let turma = fetch_turma(&state, &turma_id).await?;

    let alunos = repositories::alunos::list_by_turma(state.db(), &turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list alunos of turma"))?;

    Ok(Json(TurmaDetailResponse {
        turma: TurmaResponse::from_db(turma),
        alunos: alunos.into_iter().map(AlunoResponse::from_db).collect(),
    }))
}

async fn update_turma(
    Path(turma_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<TurmaUpdate>,
) -> Result<Json<TurmaResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    fetch_turma(&state, &turma_id).await?;

    let turma = repositories::turmas::update(
        state.db(),
        &turma_id,
        repositories::turmas::UpdateTurma {
            ano: payload.ano,
            materia: payload.materia,
            curso: payload.curso,
            periodo: payload.periodo,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update turma"))?;

    Ok(Json(TurmaResponse::from_db(turma)))
}

async fn delete_turma(
    Path(turma_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::turmas::delete_by_id(state.db(), &turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete turma"))?;

    if !deleted {
        return Err(ApiError::NotFound("Turma not found".to_string()));
    }

    Ok(Json(MessageResponse { message: "Turma deleted successfully".to_string() }))
}

async fn fetch_turma(state: &AppState, turma_id: &str) -> Result<Turma, ApiError> {
    repositories::turmas::find_by_id(state.db(), turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch turma"))?
        .ok_or_else(|| ApiError::NotFound("Turma not found".to_string()))
}

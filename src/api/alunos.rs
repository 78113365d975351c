use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
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
use crate::db::models::{Aluno, Turma};
use crate::repositories;
use crate::schemas::aluno::{AlunoCreate, AlunoResponse, AlunoUpdate};
use crate::schemas::MessageResponse;

#[derive(Debug, Deserialize)]
pub(crate) struct ListAlunosQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alunos).post(create_aluno))
        .route("/:aluno_id", get(get_aluno).put(update_aluno).delete(delete_aluno))
        .route("/:aluno_id/turmas/:turma_id", post(enroll_aluno).delete(unenroll_aluno))
}

async fn create_aluno(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AlunoCreate>,
) -> Result<(StatusCode, Json<AlunoResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::alunos::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing email"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let existing = repositories::alunos::exists_by_matricula(state.db(), &payload.matricula)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing matricula"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Matricula already registered".to_string()));
    }

    let now = primitive_now_utc();
    let aluno = repositories::alunos::create(
        state.db(),
        repositories::alunos::CreateAluno {
            id: &Uuid::new_v4().to_string(),
            nome: &payload.nome,
            email: &payload.email,
            matricula: &payload.matricula,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create aluno"))?;

    Ok((StatusCode::CREATED, Json(AlunoResponse::from_db(aluno))))
}

async fn list_alunos(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListAlunosQuery>,
) -> Result<Json<PaginatedResponse<AlunoResponse>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let search = params.search.as_deref();

    let alunos = repositories::alunos::list(state.db(), search, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list alunos"))?;
    let total_count = repositories::alunos::count(state.db(), search)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count alunos"))?;

    let items = alunos.into_iter().map(AlunoResponse::from_db).collect();
    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

async fn get_aluno(
    Path(aluno_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AlunoResponse>, ApiError> {
    let aluno = fetch_aluno(&state, &aluno_id).await?;
    Ok(Json(AlunoResponse::from_db(aluno)))
}

async fn update_aluno(
    Path(aluno_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AlunoUpdate>,
) -> Result<Json<AlunoResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    fetch_aluno(&state, &aluno_id).await?;

    if let Some(email) = &payload.email {
        let existing = repositories::alunos::exists_by_email(state.db(), email)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing email"))?;
        if existing.is_some_and(|id| id != aluno_id) {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
    }

    if let Some(matricula) = &payload.matricula {
        let existing = repositories::alunos::exists_by_matricula(state.db(), matricula)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing matricula"))?;
        if existing.is_some_and(|id| id != aluno_id) {
            return Err(ApiError::Conflict("Matricula already registered".to_string()));
        }
    }

    let aluno = repositories::alunos::update(
        state.db(),
        &aluno_id,
        repositories::alunos::UpdateAluno {
            nome: payload.nome,
            email: payload.email,
            matricula: payload.matricula,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update aluno"))?;

    Ok(Json(AlunoResponse::from_db(aluno)))
}

async fn delete_aluno(
    Path(aluno_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::alunos::delete_by_id(state.db(), &aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete aluno"))?;

    if !deleted {
        return Err(ApiError::NotFound("Aluno not found".to_string()));
    }

    Ok(Json(MessageResponse { message: "Aluno deleted successfully".to_string() }))
}

async fn enroll_aluno(
    Path((aluno_id, turma_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    fetch_aluno(&state, &aluno_id).await?;
    fetch_turma(&state, &turma_id).await?;

    let enrolled = repositories::alunos::is_enrolled(state.db(), &turma_id, &aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if enrolled {
        return Err(ApiError::BadRequest("Aluno already enrolled in this turma".to_string()));
    }

    repositories::alunos::enroll(state.db(), &turma_id, &aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to enroll aluno"))?;

    Ok(Json(MessageResponse { message: "Aluno enrolled successfully".to_string() }))
}

async fn unenroll_aluno(
    Path((aluno_id, turma_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    fetch_aluno(&state, &aluno_id).await?;
    fetch_turma(&state, &turma_id).await?;

    let removed = repositories::alunos::unenroll(state.db(), &turma_id, &aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unenroll aluno"))?;
    if !removed {
        return Err(ApiError::BadRequest("Aluno is not enrolled in this turma".to_string()));
    }

    Ok(Json(MessageResponse { message: "Aluno unenrolled successfully".to_string() }))
}

async fn fetch_aluno(state: &AppState, aluno_id: &str) -> Result<Aluno, ApiError> {
    repositories::alunos::find_by_id(state.db(), aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch aluno"))?
        .ok_or_else(|| ApiError::NotFound("Aluno not found".to_string()))
}

async fn fetch_turma(state: &AppState, turma_id: &str) -> Result<Turma, ApiError> {
    repositories::turmas::find_by_id(state.db(), turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch turma"))?
        .ok_or_else(|| ApiError::NotFound("Turma not found".to_string()))
}

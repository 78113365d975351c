use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Questao, QuestaoOpcao};
use crate::repositories;
use crate::schemas::prova::{
    OpcaoCreate, OpcaoResponse, OpcaoUpdate, QuestaoCreate, QuestaoResponse, QuestaoUpdate,
};
use crate::schemas::MessageResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_questao))
        .route("/prova/:prova_id", get(list_questoes_by_prova))
        .route("/:questao_id", get(get_questao).put(update_questao).delete(delete_questao))
        .route("/:questao_id/opcoes", get(list_opcoes).post(create_opcao))
        .route("/opcoes/:opcao_id", put(update_opcao).delete(delete_opcao))
}

async fn create_questao(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestaoCreate>,
) -> Result<(StatusCode, Json<QuestaoResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let prova = repositories::provas::find_by_id(state.db(), &payload.prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .ok_or_else(|| ApiError::NotFound("Prova not found".to_string()))?;
    ensure_prova_unlinked(&state, &prova.id).await?;

    let exists = repositories::questoes::exists_order(state.db(), &prova.id, payload.order)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check questao order"))?;
    if exists {
        return Err(ApiError::BadRequest(format!(
            "Order {} is already used in this prova",
            payload.order
        )));
    }

    let correct_count = payload.opcoes.iter().filter(|opcao| opcao.is_correct).count();
    if correct_count > 1 {
        return Err(ApiError::BadRequest(
            "Questão must not have more than one correct opção".to_string(),
        ));
    }

    let mut seen_orders = std::collections::HashSet::new();
    for opcao in &payload.opcoes {
        if !seen_orders.insert(opcao.order) {
            return Err(ApiError::BadRequest(format!("Duplicate opção order {}", opcao.order)));
        }
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let questao = repositories::questoes::create(
        &mut *tx,
        repositories::questoes::CreateQuestao {
            id: &Uuid::new_v4().to_string(),
            prova_id: &prova.id,
            order: payload.order,
            text: &payload.text,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create questao"))?;

    let mut opcoes = Vec::with_capacity(payload.opcoes.len());
    for opcao_payload in &payload.opcoes {
        let opcao = repositories::questoes::create_opcao(
            &mut *tx,
            repositories::questoes::CreateOpcao {
                id: &Uuid::new_v4().to_string(),
                questao_id: &questao.id,
                order: opcao_payload.order,
                text: &opcao_payload.text,
                is_correct: opcao_payload.is_correct,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create opcao"))?;
        opcoes.push(opcao);
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(QuestaoResponse::from_db(questao, opcoes))))
}

async fn list_questoes_by_prova(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestaoResponse>>, ApiError> {
    repositories::provas::find_by_id(state.db(), &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .ok_or_else(|| ApiError::NotFound("Prova not found".to_string()))?;

    let questoes = crate::api::provas::load_questoes_detail(&state, &prova_id).await?;
    Ok(Json(questoes))
}

async fn get_questao(
    Path(questao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuestaoResponse>, ApiError> {
    let questao = fetch_questao(&state, &questao_id).await?;
    let opcoes = repositories::questoes::list_opcoes_by_questao(state.db(), &questao.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    Ok(Json(QuestaoResponse::from_db(questao, opcoes)))
}

async fn update_questao(
    Path(questao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestaoUpdate>,
) -> Result<Json<QuestaoResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let questao = fetch_questao(&state, &questao_id).await?;
    ensure_prova_unlinked(&state, &questao.prova_id).await?;

    if let Some(order) = payload.order {
        if order != questao.order {
            let exists = repositories::questoes::exists_order(state.db(), &questao.prova_id, order)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check questao order"))?;
            if exists {
                return Err(ApiError::BadRequest(format!(
                    "Order {order} is already used in this prova"
                )));
            }
        }
    }

    let updated =
        repositories::questoes::update(state.db(), &questao_id, payload.order, payload.text.as_deref())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update questao"))?;

    let opcoes = repositories::questoes::list_opcoes_by_questao(state.db(), &questao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    Ok(Json(QuestaoResponse::from_db(updated, opcoes)))
}

async fn delete_questao(
    Path(questao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let questao = fetch_questao(&state, &questao_id).await?;
    ensure_prova_unlinked(&state, &questao.prova_id).await?;

    repositories::questoes::delete_by_id(state.db(), &questao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete questao"))?;

    Ok(Json(MessageResponse { message: "Questão deleted successfully".to_string() }))
}

async fn create_opcao(
    Path(questao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<OpcaoCreate>,
) -> Result<(StatusCode, Json<OpcaoResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let questao = fetch_questao(&state, &questao_id).await?;
    ensure_prova_unlinked(&state, &questao.prova_id).await?;

    let siblings = repositories::questoes::list_opcoes_by_questao(state.db(), &questao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;
    if siblings.iter().any(|opcao| opcao.order == payload.order) {
        return Err(ApiError::BadRequest(format!(
            "Order {} is already used in this questão",
            payload.order
        )));
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let opcao = repositories::questoes::create_opcao(
        &mut *tx,
        repositories::questoes::CreateOpcao {
            id: &Uuid::new_v4().to_string(),
            questao_id: &questao_id,
            order: payload.order,
            text: &payload.text,
            is_correct: payload.is_correct,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create opcao"))?;

    if payload.is_correct {
        repositories::questoes::demote_sibling_opcoes(&mut *tx, &questao_id, &opcao.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to demote sibling opcoes"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(OpcaoResponse::from_db(opcao))))
}

async fn list_opcoes(
    Path(questao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OpcaoResponse>>, ApiError> {
    fetch_questao(&state, &questao_id).await?;

    let opcoes = repositories::questoes::list_opcoes_by_questao(state.db(), &questao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    Ok(Json(opcoes.into_iter().map(OpcaoResponse::from_db).collect()))
}

async fn update_opcao(
    Path(opcao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<OpcaoUpdate>,
) -> Result<Json<OpcaoResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let opcao = fetch_opcao(&state, &opcao_id).await?;
    let questao = fetch_questao(&state, &opcao.questao_id).await?;
    ensure_prova_unlinked(&state, &questao.prova_id).await?;

    if let Some(order) = payload.order {
        if order != opcao.order {
            let siblings =
                repositories::questoes::list_opcoes_by_questao(state.db(), &opcao.questao_id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;
            if siblings.iter().any(|sibling| sibling.order == order) {
                return Err(ApiError::BadRequest(format!(
                    "Order {order} is already used in this questão"
                )));
            }
        }
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::questoes::update_opcao(
        &mut *tx,
        &opcao_id,
        payload.order,
        payload.text.as_deref(),
        payload.is_correct,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update opcao"))?;

    if payload.is_correct == Some(true) {
        repositories::questoes::demote_sibling_opcoes(&mut *tx, &opcao.questao_id, &opcao_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to demote sibling opcoes"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok(Json(OpcaoResponse::from_db(updated)))
}

async fn delete_opcao(
    Path(opcao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let opcao = fetch_opcao(&state, &opcao_id).await?;
    let questao = fetch_questao(&state, &opcao.questao_id).await?;
    ensure_prova_unlinked(&state, &questao.prova_id).await?;

    repositories::questoes::delete_opcao_by_id(state.db(), &opcao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete opcao"))?;

    Ok(Json(MessageResponse { message: "Opção deleted successfully".to_string() }))
}

/// Structural edits are refused once the prova is linked to any turma, so
/// already distributed permutations keep pointing at the right content.
async fn ensure_prova_unlinked(state: &AppState, prova_id: &str) -> Result<(), ApiError> {
    let links = repositories::provas::count_links_by_prova(state.db(), prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check prova links"))?;
    if links > 0 {
        return Err(ApiError::Conflict(
            "Prova is linked to turmas; structural changes are not allowed".to_string(),
        ));
    }
    Ok(())
}

async fn fetch_questao(state: &AppState, questao_id: &str) -> Result<Questao, ApiError> {
    repositories::questoes::find_by_id(state.db(), questao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questao"))?
        .ok_or_else(|| ApiError::NotFound("Questão not found".to_string()))
}

async fn fetch_opcao(state: &AppState, opcao_id: &str) -> Result<QuestaoOpcao, ApiError> {
    repositories::questoes::find_opcao_by_id(state.db(), opcao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch opcao"))?
        .ok_or_else(|| ApiError::NotFound("Opção not found".to_string()))
}

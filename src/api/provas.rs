use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::pdf::{map_latex_error, pdf_response};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Prova;
use crate::repositories;
use crate::schemas::prova::{
    ProvaCreate, ProvaDetailResponse, ProvaQuestaoCreate, ProvaResponse, ProvaUpdate,
    QuestaoResponse,
};
use crate::schemas::MessageResponse;
use crate::services::conteudo::montar_questoes;
use crate::services::latex::{render_cartao_resposta, BubbleQuestion};
use crate::services::latex_compiler;

#[derive(Debug, Deserialize)]
pub(crate) struct ListProvasQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_provas).post(create_prova))
        .route("/:prova_id", get(get_prova).put(update_prova).delete(delete_prova))
        .route("/:prova_id/cartao-resposta", get(cartao_resposta_pdf))
}

async fn create_prova(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProvaCreate>,
) -> Result<(StatusCode, Json<ProvaDetailResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_questoes_payload(&payload.questoes)?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let prova = repositories::provas::create(
        &mut *tx,
        repositories::provas::CreateProva {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            created_by: Some(&user.id),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create prova"))?;

    let mut questoes = Vec::with_capacity(payload.questoes.len());
    for questao_payload in &payload.questoes {
        let questao = repositories::questoes::create(
            &mut *tx,
            repositories::questoes::CreateQuestao {
                id: &Uuid::new_v4().to_string(),
                prova_id: &prova.id,
                order: questao_payload.order,
                text: &questao_payload.text,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create questao"))?;

        let mut opcoes = Vec::with_capacity(questao_payload.opcoes.len());
        for opcao_payload in &questao_payload.opcoes {
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

        questoes.push(QuestaoResponse::from_db(questao, opcoes));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let response = ProvaDetailResponse { prova: ProvaResponse::from_db(prova), questoes };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_provas(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListProvasQuery>,
) -> Result<Json<PaginatedResponse<ProvaResponse>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let search = params.search.as_deref();

    let provas = repositories::provas::list(state.db(), search, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list provas"))?;
    let total_count = repositories::provas::count(state.db(), search)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count provas"))?;

    let items = provas.into_iter().map(ProvaResponse::from_db).collect();
    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

async fn get_prova(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ProvaDetailResponse>, ApiError> {
    let prova = fetch_prova(&state, &prova_id).await?;
    let questoes = load_questoes_detail(&state, &prova_id).await?;

    Ok(Json(ProvaDetailResponse { prova: ProvaResponse::from_db(prova), questoes }))
}

async fn update_prova(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProvaUpdate>,
) -> Result<Json<ProvaResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    fetch_prova(&state, &prova_id).await?;

    let prova = repositories::provas::rename(state.db(), &prova_id, &payload.name, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update prova"))?;

    Ok(Json(ProvaResponse::from_db(prova)))
}

async fn delete_prova(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let links = repositories::provas::count_links_by_prova(state.db(), &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check prova links"))?;
    if links > 0 {
        return Err(ApiError::Conflict(
            "Prova is linked to turmas; unlink it before deleting".to_string(),
        ));
    }

    let deleted = repositories::provas::delete_by_id(state.db(), &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete prova"))?;
    if !deleted {
        return Err(ApiError::NotFound("Prova not found".to_string()));
    }

    Ok(Json(MessageResponse { message: "Prova deleted successfully".to_string() }))
}

/// Blank answer card for the whole prova, questions numbered in authoring
/// order. Useful for printing extra sheets without picking a student.
async fn cartao_resposta_pdf(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    fetch_prova(&state, &prova_id).await?;

    let questoes = repositories::questoes::list_by_prova(state.db(), &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questoes"))?;
    if questoes.is_empty() {
        return Err(ApiError::BadRequest("Prova has no questões".to_string()));
    }

    let ids: Vec<String> = questoes.iter().map(|questao| questao.id.clone()).collect();
    let opcoes = repositories::questoes::list_opcoes_by_questao_ids(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    let conteudo = montar_questoes(questoes, opcoes);
    let rows: Vec<BubbleQuestion> = conteudo
        .iter()
        .enumerate()
        .map(|(posicao, questao)| BubbleQuestion {
            number: posicao + 1,
            choices: questao.opcoes.len(),
            correct: None,
        })
        .collect();

    let source = render_cartao_resposta(&rows);
    let bytes = latex_compiler::compile_pdf(
        &source,
        &format!("cartao_resposta_{prova_id}"),
        state.settings().latex(),
    )
    .await
    .map_err(map_latex_error)?;

    Ok(pdf_response(bytes, &format!("attachment; filename=cartao_resposta_{prova_id}.pdf")))
}

fn validate_questoes_payload(questoes: &[ProvaQuestaoCreate]) -> Result<(), ApiError> {
    let mut seen_orders = HashSet::new();
    for questao in questoes {
        if !seen_orders.insert(questao.order) {
            return Err(ApiError::BadRequest(format!(
                "Duplicate questão order {}",
                questao.order
            )));
        }

        let correct_count = questao.opcoes.iter().filter(|opcao| opcao.is_correct).count();
        if correct_count > 1 {
            return Err(ApiError::BadRequest(format!(
                "Questão {} has more than one correct opção",
                questao.order
            )));
        }

        let mut seen_opcao_orders = HashSet::new();
        for opcao in &questao.opcoes {
            if !seen_opcao_orders.insert(opcao.order) {
                return Err(ApiError::BadRequest(format!(
                    "Duplicate opção order {} in questão {}",
                    opcao.order, questao.order
                )));
            }
        }
    }
    Ok(())
}

async fn fetch_prova(state: &AppState, prova_id: &str) -> Result<Prova, ApiError> {
    repositories::provas::find_by_id(state.db(), prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .ok_or_else(|| ApiError::NotFound("Prova not found".to_string()))
}

pub(in crate::api) async fn load_questoes_detail(
    state: &AppState,
    prova_id: &str,
) -> Result<Vec<QuestaoResponse>, ApiError> {
    let questoes = repositories::questoes::list_by_prova(state.db(), prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questoes"))?;

    let ids: Vec<String> = questoes.iter().map(|questao| questao.id.clone()).collect();
    let opcoes = repositories::questoes::list_opcoes_by_questao_ids(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    let mut por_questao: std::collections::HashMap<String, Vec<_>> = std::collections::HashMap::new();
    for opcao in opcoes {
        por_questao.entry(opcao.questao_id.clone()).or_default().push(opcao);
    }

    Ok(questoes
        .into_iter()
        .map(|questao| {
            let opcoes = por_questao.remove(&questao.id).unwrap_or_default();
            QuestaoResponse::from_db(questao, opcoes)
        })
        .collect())
}

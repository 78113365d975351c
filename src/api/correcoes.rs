use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::validate_scan_upload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Correcao;
use crate::repositories;
use crate::schemas::aluno::AlunoResponse;
use crate::schemas::correcao::{
    CorrecaoDetailResponse, CorrecaoResponse, CorrecaoRespostaResponse,
};
use crate::schemas::prova::ProvaResponse;
use crate::schemas::turma::TurmaResponse;
use crate::schemas::user::UserResponse;
use crate::schemas::MessageResponse;
use crate::services::correcao::grade_respostas;
use crate::services::gabarito::resolve_gabarito;
use crate::services::omr::{run_omr, OmrError};

#[derive(Debug, Deserialize)]
pub(crate) struct ListCorrecoesQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
    #[serde(default)]
    aluno_id: Option<String>,
    #[serde(default)]
    turma_id: Option<String>,
    #[serde(default)]
    prova_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/upload/:aluno_id/:turma_id/:prova_id", post(upload_correcao))
        .route("/correcoes", get(list_correcoes))
        .route("/correcoes/:correcao_id", get(get_correcao).delete(delete_correcao))
}

/// Grades a scanned answer card. The image goes through the OMR script, the
/// detected marks are compared against the gabarito recovered from the
/// aluno's stored randomization, and the result is persisted atomically.
async fn upload_correcao(
    Path((aluno_id, turma_id, prova_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CorrecaoDetailResponse>), ApiError> {
    let aluno = repositories::alunos::find_by_id(state.db(), &aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch aluno"))?
        .ok_or_else(|| ApiError::NotFound("Aluno not found".to_string()))?;
    let turma = repositories::turmas::find_by_id(state.db(), &turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch turma"))?
        .ok_or_else(|| ApiError::NotFound("Turma not found".to_string()))?;
    let prova = repositories::provas::find_by_id(state.db(), &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .ok_or_else(|| ApiError::NotFound("Prova not found".to_string()))?;

    repositories::randomizacoes::find_link_by_pair(state.db(), &turma_id, &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check link"))?
        .ok_or_else(|| ApiError::NotFound("Turma and prova are not linked".to_string()))?;
    let randomizacao =
        repositories::randomizacoes::find_by_aluno_and_prova(state.db(), &aluno_id, &prova_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch randomizacao"))?
            .ok_or_else(|| ApiError::NotFound("Randomização not found".to_string()))?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let max_bytes = state.settings().upload().max_upload_size_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }
        filename = field.file_name().map(|s| s.to_string());
        content_type = field.content_type().map(|s| s.to_string());
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            let next_size = bytes.len() as u64 + chunk.len() as u64;
            if next_size > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    state.settings().upload().max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let filename = filename.unwrap_or_else(|| "image.jpg".to_string());
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    validate_scan_upload(
        &filename,
        &content_type,
        &state.settings().upload().allowed_image_extensions,
    )?;

    let detections = run_omr(&file_bytes, &filename, state.settings().omr())
        .await
        .map_err(map_omr_error)?;
    if detections.is_empty() {
        return Err(ApiError::BadRequest("No marks detected in the image".to_string()));
    }

    let conteudo = crate::api::randomizacao::load_conteudo(&state, &prova_id).await?;
    let gabarito = resolve_gabarito(
        &conteudo,
        &randomizacao.questoes_order.0,
        &randomizacao.alternativas_order.0,
    );
    let outcome = grade_respostas(&detections, &gabarito);

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let correcao = repositories::correcoes::create(
        &mut *tx,
        repositories::correcoes::CreateCorrecao {
            id: &Uuid::new_v4().to_string(),
            aluno_id: &aluno.id,
            turma_id: &turma.id,
            prova_id: &prova.id,
            corrigido_por: Some(&user.id),
            data_correcao: now,
            nota: outcome.nota,
            total_questoes: outcome.total_questoes as i32,
            acertos: outcome.acertos as i32,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create correcao"))?;

    let mut respostas = Vec::with_capacity(outcome.respostas.len());
    for avaliada in &outcome.respostas {
        let resposta = repositories::correcoes::create_resposta(
            &mut *tx,
            repositories::correcoes::CreateResposta {
                id: &Uuid::new_v4().to_string(),
                correcao_id: &correcao.id,
                questao_numero: avaliada.questao_numero as i32,
                resposta_marcada: avaliada.resposta_marcada.as_deref(),
                resposta_correta: avaliada.resposta_correta.as_deref(),
                esta_correta: avaliada.esta_correta,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create resposta"))?;
        respostas.push(CorrecaoRespostaResponse::from_db(resposta));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("correcoes_graded_total").increment(1);
    tracing::info!(
        correcao_id = %correcao.id,
        nota = correcao.nota,
        acertos = correcao.acertos,
        total_questoes = correcao.total_questoes,
        "correcao graded"
    );

    let response = CorrecaoDetailResponse {
        correcao: CorrecaoResponse::from_db(correcao),
        respostas,
        aluno: Some(AlunoResponse::from_db(aluno)),
        turma: Some(TurmaResponse::from_db(turma)),
        prova: Some(ProvaResponse::from_db(prova)),
        corretor: Some(UserResponse::from_db(user)),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_correcoes(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListCorrecoesQuery>,
) -> Result<Json<PaginatedResponse<CorrecaoResponse>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let aluno_id = params.aluno_id.as_deref();
    let turma_id = params.turma_id.as_deref();
    let prova_id = params.prova_id.as_deref();

    let correcoes =
        repositories::correcoes::list(state.db(), aluno_id, turma_id, prova_id, skip, limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list correcoes"))?;
    let total_count = repositories::correcoes::count(state.db(), aluno_id, turma_id, prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count correcoes"))?;

    let items = correcoes.into_iter().map(CorrecaoResponse::from_db).collect();
    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

async fn get_correcao(
    Path(correcao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CorrecaoDetailResponse>, ApiError> {
    let correcao = repositories::correcoes::find_by_id(state.db(), &correcao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch correcao"))?
        .ok_or_else(|| ApiError::NotFound("Correção not found".to_string()))?;

    Ok(Json(load_detail(&state, correcao).await?))
}

async fn delete_correcao(
    Path(correcao_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::correcoes::delete_by_id(state.db(), &correcao_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete correcao"))?;
    if !deleted {
        return Err(ApiError::NotFound("Correção not found".to_string()));
    }

    Ok(Json(MessageResponse { message: "Correção deleted successfully".to_string() }))
}

/// References kept after the correcao was graded may have been deleted since;
/// each related record comes back as `None` instead of failing the whole read.
async fn load_detail(
    state: &AppState,
    correcao: Correcao,
) -> Result<CorrecaoDetailResponse, ApiError> {
    let respostas = repositories::correcoes::list_respostas_by_correcao(state.db(), &correcao.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load respostas"))?;

    let aluno = repositories::alunos::find_by_id(state.db(), &correcao.aluno_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch aluno"))?
        .map(AlunoResponse::from_db);
    let turma = repositories::turmas::find_by_id(state.db(), &correcao.turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch turma"))?
        .map(TurmaResponse::from_db);
    let prova = repositories::provas::find_by_id(state.db(), &correcao.prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .map(ProvaResponse::from_db);
    let corretor = match correcao.corrigido_por.as_deref() {
        Some(user_id) => repositories::users::find_by_id(state.db(), user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch corretor"))?
            .map(UserResponse::from_db),
        None => None,
    };

    Ok(CorrecaoDetailResponse {
        correcao: CorrecaoResponse::from_db(correcao),
        respostas: respostas.into_iter().map(CorrecaoRespostaResponse::from_db).collect(),
        aluno,
        turma,
        prova,
        corretor,
    })
}

fn map_omr_error(error: OmrError) -> ApiError {
    match error {
        OmrError::ScriptMissing(path) => {
            tracing::error!(path, "OMR script missing");
            ApiError::ServiceUnavailable(
                "OMR processing is not available on the server".to_string(),
            )
        }
        OmrError::Timeout(seconds) => {
            metrics::counter!("omr_failures_total", "kind" => "timeout".to_string()).increment(1);
            ApiError::Internal(format!("OMR processing timed out after {seconds}s"))
        }
        OmrError::ScriptFailed { exit_code, stderr } => {
            metrics::counter!("omr_failures_total", "kind" => "failed".to_string()).increment(1);
            tracing::error!(?exit_code, stderr, "OMR script failed");
            ApiError::Internal("OMR processing failed".to_string())
        }
        OmrError::NoOutput => {
            ApiError::BadRequest("OMR could not read the answer card from the image".to_string())
        }
        OmrError::Csv(err) => ApiError::internal(err, "Failed to parse OMR results"),
        OmrError::Io(err) => ApiError::internal(err, "OMR processing failed"),
    }
}

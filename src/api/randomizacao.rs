use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pdf::{map_latex_error, pdf_response, zip_response};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{AlunoRandomizacao, Prova, Turma, TurmaProva};
use crate::repositories;
use crate::schemas::prova::ProvaResponse;
use crate::schemas::randomizacao::{
    AlunoRandomizacaoResponse, ProvasDisponiveisResponse, TurmaProvaResponse,
    TurmasDisponiveisResponse,
};
use crate::schemas::turma::TurmaResponse;
use crate::schemas::MessageResponse;
use crate::services::conteudo::{montar_questoes, QuestaoConteudo};
use crate::services::export::build_pdf_archive;
use crate::services::gabarito::resolve_gabarito;
use crate::services::latex::{render_gabarito, render_prova_content, BubbleQuestion};
use crate::services::latex_compiler;
use crate::services::randomizacao::{generate_randomizacao, has_randomizable_content};

#[derive(Debug, Deserialize)]
pub(crate) struct ListLinksQuery {
    #[serde(default)]
    turma_id: Option<String>,
    #[serde(default)]
    prova_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/link/:turma_id/:prova_id", post(link_prova))
        .route("/unlink/:turma_id/:prova_id", delete(unlink_prova))
        .route("/turmas-provas", get(list_links))
        .route("/alunos/:turma_prova_id", get(list_randomizacoes_by_link))
        .route("/aluno/:aluno_id/prova/:prova_id", get(get_randomizacao))
        .route("/aluno/:aluno_id/prova/:prova_id/content", get(prova_personalizada_pdf))
        .route("/gabarito/:aluno_id/:prova_id", get(gabarito_pdf))
        .route("/turmas/disponiveis/:prova_id", get(turmas_disponiveis))
        .route("/provas/disponiveis/:turma_id", get(provas_disponiveis))
        .route("/download-zip/:turma_prova_id", get(download_provas_zip))
}

/// Links a prova to a turma and draws one independent randomization per
/// enrolled aluno, all inside one transaction. Alunos enrolled later get no
/// draw retroactively; relink to cover them.
async fn link_prova(
    Path((turma_id, prova_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TurmaProvaResponse>), ApiError> {
    fetch_turma(&state, &turma_id).await?;
    fetch_prova(&state, &prova_id).await?;

    let conteudo = load_conteudo(&state, &prova_id).await?;
    if !has_randomizable_content(&conteudo) {
        return Err(ApiError::BadRequest("Prova has no content to randomize".to_string()));
    }

    let existing = repositories::randomizacoes::find_link_by_pair(state.db(), &turma_id, &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing link"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Prova is already linked to this turma".to_string()));
    }

    let alunos = repositories::alunos::list_by_turma(state.db(), &turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list alunos"))?;
    if alunos.is_empty() {
        tracing::warn!(%turma_id, %prova_id, "linking prova to turma without enrolled alunos");
    }

    // ThreadRng is not Send; finish every draw before the first await.
    let sorteios: Vec<_> = {
        let mut rng = rand::thread_rng();
        alunos.iter().map(|_| generate_randomizacao(&conteudo, &mut rng)).collect()
    };

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let link = repositories::randomizacoes::create_link(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        &turma_id,
        &prova_id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create link"))?;

    for (aluno, sorteio) in alunos.iter().zip(sorteios) {
        repositories::randomizacoes::create(
            &mut *tx,
            repositories::randomizacoes::CreateRandomizacao {
                id: &Uuid::new_v4().to_string(),
                turma_prova_id: &link.id,
                aluno_id: &aluno.id,
                questoes_order: sqlx::types::Json(sorteio.questoes_order),
                alternativas_order: sqlx::types::Json(sorteio.alternativas_order),
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create randomizacao"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("randomizacoes_generated_total").increment(alunos.len() as u64);
    tracing::info!(%turma_id, %prova_id, alunos = alunos.len(), "prova linked to turma");

    Ok((StatusCode::CREATED, Json(TurmaProvaResponse::from_db(link))))
}

async fn unlink_prova(
    Path((turma_id, prova_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::randomizacoes::delete_link_by_pair(state.db(), &turma_id, &prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete link"))?;
    if !deleted {
        return Err(ApiError::NotFound("Vínculo not found".to_string()));
    }

    tracing::info!(%turma_id, %prova_id, "prova unlinked from turma");
    Ok(Json(MessageResponse { message: "Prova unlinked successfully".to_string() }))
}

async fn list_links(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListLinksQuery>,
) -> Result<Json<Vec<TurmaProvaResponse>>, ApiError> {
    let links = repositories::randomizacoes::list_links(
        state.db(),
        params.turma_id.as_deref(),
        params.prova_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list links"))?;

    Ok(Json(links.into_iter().map(TurmaProvaResponse::from_db).collect()))
}

async fn list_randomizacoes_by_link(
    Path(turma_prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AlunoRandomizacaoResponse>>, ApiError> {
    fetch_link(&state, &turma_prova_id).await?;

    let randomizacoes = repositories::randomizacoes::list_by_turma_prova(state.db(), &turma_prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list randomizacoes"))?;

    Ok(Json(randomizacoes.into_iter().map(AlunoRandomizacaoResponse::from_db).collect()))
}

async fn get_randomizacao(
    Path((aluno_id, prova_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AlunoRandomizacaoResponse>, ApiError> {
    let randomizacao = fetch_randomizacao(&state, &aluno_id, &prova_id).await?;
    Ok(Json(AlunoRandomizacaoResponse::from_db(randomizacao)))
}

/// Compiles the personalized exam body for one aluno, with questões and
/// opções in that aluno's stored order.
async fn prova_personalizada_pdf(
    Path((aluno_id, prova_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let randomizacao = fetch_randomizacao(&state, &aluno_id, &prova_id).await?;
    let prova = fetch_prova(&state, &prova_id).await?;
    let conteudo = load_conteudo(&state, &prova_id).await?;

    let source = render_prova_content(
        &prova.name,
        &conteudo,
        &randomizacao.questoes_order.0,
        &randomizacao.alternativas_order.0,
    );
    let bytes = latex_compiler::compile_pdf(
        &source,
        &format!("prova_{aluno_id}_{prova_id}"),
        state.settings().latex(),
    )
    .await
    .map_err(map_latex_error)?;

    Ok(pdf_response(bytes, &format!("inline; filename=prova_aluno_{aluno_id}.pdf")))
}

/// Compiles the filled answer key for one aluno: the correct bubble per
/// personalized question number, recovered from the stored permutations.
async fn gabarito_pdf(
    Path((aluno_id, prova_id)): Path<(String, String)>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let randomizacao = fetch_randomizacao(&state, &aluno_id, &prova_id).await?;
    let conteudo = load_conteudo(&state, &prova_id).await?;

    let rows = bubble_rows(&conteudo, &randomizacao);
    let source = render_gabarito(&rows);
    let bytes = latex_compiler::compile_pdf(
        &source,
        &format!("gabarito_{aluno_id}_{prova_id}"),
        state.settings().latex(),
    )
    .await
    .map_err(map_latex_error)?;

    Ok(pdf_response(bytes, &format!("attachment; filename=gabarito_aluno_{aluno_id}.pdf")))
}

async fn turmas_disponiveis(
    Path(prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TurmasDisponiveisResponse>, ApiError> {
    fetch_prova(&state, &prova_id).await?;

    let linked: HashSet<String> =
        repositories::randomizacoes::linked_turma_ids_for_prova(state.db(), &prova_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list linked turmas"))?
            .into_iter()
            .collect();
    let turmas = repositories::turmas::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list turmas"))?;

    let (vinculadas, disponiveis): (Vec<_>, Vec<_>) =
        turmas.into_iter().partition(|turma| linked.contains(&turma.id));

    Ok(Json(TurmasDisponiveisResponse {
        disponiveis: disponiveis.into_iter().map(TurmaResponse::from_db).collect(),
        vinculadas: vinculadas.into_iter().map(TurmaResponse::from_db).collect(),
    }))
}

async fn provas_disponiveis(
    Path(turma_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ProvasDisponiveisResponse>, ApiError> {
    fetch_turma(&state, &turma_id).await?;

    let linked: HashSet<String> =
        repositories::randomizacoes::linked_prova_ids_for_turma(state.db(), &turma_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list linked provas"))?
            .into_iter()
            .collect();
    let provas = repositories::provas::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list provas"))?;

    let (vinculadas, disponiveis): (Vec<_>, Vec<_>) =
        provas.into_iter().partition(|prova| linked.contains(&prova.id));

    Ok(Json(ProvasDisponiveisResponse {
        disponiveis: disponiveis.into_iter().map(ProvaResponse::from_db).collect(),
        vinculadas: vinculadas.into_iter().map(ProvaResponse::from_db).collect(),
    }))
}

/// Compiles every aluno's personalized prova for one link and streams them
/// back as a single zip, one `prova_<matricula>.pdf` entry per aluno.
async fn download_provas_zip(
    Path(turma_prova_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let link = fetch_link(&state, &turma_prova_id).await?;
    let prova = fetch_prova(&state, &link.prova_id).await?;
    let conteudo = load_conteudo(&state, &link.prova_id).await?;

    let randomizacoes = repositories::randomizacoes::list_by_turma_prova(state.db(), &turma_prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list randomizacoes"))?;
    if randomizacoes.is_empty() {
        return Err(ApiError::BadRequest("Vínculo has no randomizações".to_string()));
    }

    let mut entries = Vec::with_capacity(randomizacoes.len());
    for randomizacao in &randomizacoes {
        let Some(aluno) = repositories::alunos::find_by_id(state.db(), &randomizacao.aluno_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch aluno"))?
        else {
            tracing::warn!(aluno_id = %randomizacao.aluno_id, "randomizacao points at a missing aluno");
            continue;
        };

        let source = render_prova_content(
            &prova.name,
            &conteudo,
            &randomizacao.questoes_order.0,
            &randomizacao.alternativas_order.0,
        );
        let bytes = latex_compiler::compile_pdf(
            &source,
            &format!("prova_{}", aluno.id),
            state.settings().latex(),
        )
        .await
        .map_err(map_latex_error)?;

        entries.push((format!("prova_{}.pdf", aluno.matricula), bytes));
    }

    let archive = build_pdf_archive(&entries)
        .map_err(|e| ApiError::internal(e, "Failed to build zip archive"))?;

    tracing::info!(%turma_prova_id, provas = entries.len(), "compiled prova batch for download");
    Ok(zip_response(archive, &format!("attachment; filename=provas_{turma_prova_id}.zip")))
}

/// One bubble row per personalized position; the correct letter comes from
/// the resolved gabarito and stays `None` for unresolvable questões.
fn bubble_rows(conteudo: &[QuestaoConteudo], randomizacao: &AlunoRandomizacao) -> Vec<BubbleQuestion> {
    let gabarito = resolve_gabarito(
        conteudo,
        &randomizacao.questoes_order.0,
        &randomizacao.alternativas_order.0,
    );

    randomizacao
        .questoes_order
        .0
        .iter()
        .enumerate()
        .filter_map(|(posicao, &original_index)| {
            let questao = conteudo.get(original_index)?;
            let numero = posicao + 1;
            Some(BubbleQuestion {
                number: numero,
                choices: questao.opcoes.len(),
                correct: gabarito.get(&numero).copied(),
            })
        })
        .collect()
}

pub(in crate::api) async fn load_conteudo(
    state: &AppState,
    prova_id: &str,
) -> Result<Vec<QuestaoConteudo>, ApiError> {
    let questoes = repositories::questoes::list_by_prova(state.db(), prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questoes"))?;

    let ids: Vec<String> = questoes.iter().map(|questao| questao.id.clone()).collect();
    let opcoes = repositories::questoes::list_opcoes_by_questao_ids(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load opcoes"))?;

    Ok(montar_questoes(questoes, opcoes))
}

async fn fetch_turma(state: &AppState, turma_id: &str) -> Result<Turma, ApiError> {
    repositories::turmas::find_by_id(state.db(), turma_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch turma"))?
        .ok_or_else(|| ApiError::NotFound("Turma not found".to_string()))
}

async fn fetch_prova(state: &AppState, prova_id: &str) -> Result<Prova, ApiError> {
    repositories::provas::find_by_id(state.db(), prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prova"))?
        .ok_or_else(|| ApiError::NotFound("Prova not found".to_string()))
}

async fn fetch_link(state: &AppState, turma_prova_id: &str) -> Result<TurmaProva, ApiError> {
    repositories::randomizacoes::find_link_by_id(state.db(), turma_prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch link"))?
        .ok_or_else(|| ApiError::NotFound("Vínculo not found".to_string()))
}

async fn fetch_randomizacao(
    state: &AppState,
    aluno_id: &str,
    prova_id: &str,
) -> Result<AlunoRandomizacao, ApiError> {
    repositories::randomizacoes::find_by_aluno_and_prova(state.db(), aluno_id, prova_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch randomizacao"))?
        .ok_or_else(|| ApiError::NotFound("Randomização not found".to_string()))
}

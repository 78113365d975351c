use std::collections::HashMap;

use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::{AlunoRandomizacao, TurmaProva};
use crate::schemas::prova::ProvaResponse;
use crate::schemas::turma::TurmaResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TurmaProvaResponse {
    pub(crate) id: String,
    pub(crate) turma_id: String,
    pub(crate) prova_id: String,
    pub(crate) created_at: String,
}

impl TurmaProvaResponse {
    pub(crate) fn from_db(link: TurmaProva) -> Self {
        Self {
            id: link.id,
            turma_id: link.turma_id,
            prova_id: link.prova_id,
            created_at: format_primitive(link.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AlunoRandomizacaoResponse {
    pub(crate) id: String,
    pub(crate) turma_prova_id: String,
    pub(crate) aluno_id: String,
    pub(crate) questoes_order: Vec<usize>,
    pub(crate) alternativas_order: HashMap<String, Vec<usize>>,
    pub(crate) created_at: String,
}

impl AlunoRandomizacaoResponse {
    pub(crate) fn from_db(randomizacao: AlunoRandomizacao) -> Self {
        Self {
            id: randomizacao.id,
            turma_prova_id: randomizacao.turma_prova_id,
            aluno_id: randomizacao.aluno_id,
            questoes_order: randomizacao.questoes_order.0,
            alternativas_order: randomizacao.alternativas_order.0,
            created_at: format_primitive(randomizacao.created_at),
        }
    }
}

/// Split listing used by the link-picker screens.
#[derive(Debug, Serialize)]
pub(crate) struct TurmasDisponiveisResponse {
    pub(crate) disponiveis: Vec<TurmaResponse>,
    pub(crate) vinculadas: Vec<TurmaResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProvasDisponiveisResponse {
    pub(crate) disponiveis: Vec<ProvaResponse>,
    pub(crate) vinculadas: Vec<ProvaResponse>,
}

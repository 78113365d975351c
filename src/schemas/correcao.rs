use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::{Correcao, CorrecaoResposta};
use crate::schemas::aluno::AlunoResponse;
use crate::schemas::prova::ProvaResponse;
use crate::schemas::turma::TurmaResponse;
use crate::schemas::user::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct CorrecaoResponse {
    pub(crate) id: String,
    pub(crate) aluno_id: String,
    pub(crate) turma_id: String,
    pub(crate) prova_id: String,
    pub(crate) corrigido_por: Option<String>,
    pub(crate) data_correcao: String,
    pub(crate) nota: f64,
    pub(crate) total_questoes: i32,
    pub(crate) acertos: i32,
}

impl CorrecaoResponse {
    pub(crate) fn from_db(correcao: Correcao) -> Self {
        Self {
            id: correcao.id,
            aluno_id: correcao.aluno_id,
            turma_id: correcao.turma_id,
            prova_id: correcao.prova_id,
            corrigido_por: correcao.corrigido_por,
            data_correcao: format_primitive(correcao.data_correcao),
            nota: correcao.nota,
            total_questoes: correcao.total_questoes,
            acertos: correcao.acertos,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CorrecaoRespostaResponse {
    pub(crate) id: String,
    pub(crate) questao_numero: i32,
    pub(crate) resposta_marcada: Option<String>,
    pub(crate) resposta_correta: Option<String>,
    pub(crate) esta_correta: Option<bool>,
}

impl CorrecaoRespostaResponse {
    pub(crate) fn from_db(resposta: CorrecaoResposta) -> Self {
        Self {
            id: resposta.id,
            questao_numero: resposta.questao_numero,
            resposta_marcada: resposta.resposta_marcada,
            resposta_correta: resposta.resposta_correta,
            esta_correta: resposta.esta_correta,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CorrecaoDetailResponse {
    #[serde(flatten)]
    pub(crate) correcao: CorrecaoResponse,
    pub(crate) respostas: Vec<CorrecaoRespostaResponse>,
    pub(crate) aluno: Option<AlunoResponse>,
    pub(crate) turma: Option<TurmaResponse>,
    pub(crate) prova: Option<ProvaResponse>,
    pub(crate) corretor: Option<UserResponse>,
}

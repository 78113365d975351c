use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Prova, Questao, QuestaoOpcao};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OpcaoCreate {
    #[validate(range(min = 1, message = "order must be 1-indexed"))]
    pub(crate) order: i32,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

/// Questão payload nested inside a prova creation request.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProvaQuestaoCreate {
    #[validate(range(min = 1, message = "order must be 1-indexed"))]
    pub(crate) order: i32,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) opcoes: Vec<OpcaoCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProvaCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questoes: Vec<ProvaQuestaoCreate>,
}

/// Standalone questão creation targeting an existing prova.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestaoCreate {
    #[validate(length(min = 1, message = "prova_id must not be empty"))]
    pub(crate) prova_id: String,
    #[validate(range(min = 1, message = "order must be 1-indexed"))]
    pub(crate) order: i32,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) opcoes: Vec<OpcaoCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProvaUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestaoUpdate {
    #[serde(default)]
    #[validate(range(min = 1, message = "order must be 1-indexed"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OpcaoUpdate {
    #[serde(default)]
    #[validate(range(min = 1, message = "order must be 1-indexed"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpcaoResponse {
    pub(crate) id: String,
    pub(crate) questao_id: String,
    pub(crate) order: i32,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: String,
}

impl OpcaoResponse {
    pub(crate) fn from_db(opcao: QuestaoOpcao) -> Self {
        Self {
            id: opcao.id,
            questao_id: opcao.questao_id,
            order: opcao.order,
            text: opcao.text,
            is_correct: opcao.is_correct,
            created_at: format_primitive(opcao.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestaoResponse {
    pub(crate) id: String,
    pub(crate) prova_id: String,
    pub(crate) order: i32,
    pub(crate) text: String,
    pub(crate) opcoes: Vec<OpcaoResponse>,
    pub(crate) created_at: String,
}

impl QuestaoResponse {
    pub(crate) fn from_db(questao: Questao, opcoes: Vec<QuestaoOpcao>) -> Self {
        Self {
            id: questao.id,
            prova_id: questao.prova_id,
            order: questao.order,
            text: questao.text,
            opcoes: opcoes.into_iter().map(OpcaoResponse::from_db).collect(),
            created_at: format_primitive(questao.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProvaResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ProvaResponse {
    pub(crate) fn from_db(prova: Prova) -> Self {
        Self {
            id: prova.id,
            name: prova.name,
            created_by: prova.created_by,
            created_at: format_primitive(prova.created_at),
            updated_at: format_primitive(prova.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProvaDetailResponse {
    #[serde(flatten)]
    pub(crate) prova: ProvaResponse,
    pub(crate) questoes: Vec<QuestaoResponse>,
}

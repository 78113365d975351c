use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Aluno {
    pub(crate) id: String,
    pub(crate) nome: String,
    pub(crate) email: String,
    pub(crate) matricula: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Turma {
    pub(crate) id: String,
    pub(crate) ano: i32,
    pub(crate) materia: String,
    pub(crate) curso: String,
    pub(crate) periodo: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Prova {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// `order` is the 1-indexed authoring position, unique per prova.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Questao {
    pub(crate) id: String,
    pub(crate) prova_id: String,
    pub(crate) order: i32,
    pub(crate) text: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestaoOpcao {
    pub(crate) id: String,
    pub(crate) questao_id: String,
    pub(crate) order: i32,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TurmaProva {
    pub(crate) id: String,
    pub(crate) turma_id: String,
    pub(crate) prova_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Personalized orderings for one aluno under one turma_prova.
///
/// `questoes_order[p]` is the original 0-indexed question position shown at
/// personalized position `p`. `alternativas_order` maps each questão id to
/// the same forward convention over its choices; a questão with no choices
/// maps to an empty vector.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AlunoRandomizacao {
    pub(crate) id: String,
    pub(crate) turma_prova_id: String,
    pub(crate) aluno_id: String,
    pub(crate) questoes_order: Json<Vec<usize>>,
    pub(crate) alternativas_order: Json<HashMap<String, Vec<usize>>>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Correcao {
    pub(crate) id: String,
    pub(crate) aluno_id: String,
    pub(crate) turma_id: String,
    pub(crate) prova_id: String,
    pub(crate) corrigido_por: Option<String>,
    pub(crate) data_correcao: PrimitiveDateTime,
    pub(crate) nota: f64,
    pub(crate) total_questoes: i32,
    pub(crate) acertos: i32,
}

/// One graded answer; `esta_correta` stays null for blank marks so
/// "unanswered" is distinguishable from "wrong".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CorrecaoResposta {
    pub(crate) id: String,
    pub(crate) correcao_id: String,
    pub(crate) questao_numero: i32,
    pub(crate) resposta_marcada: Option<String>,
    pub(crate) resposta_correta: Option<String>,
    pub(crate) esta_correta: Option<bool>,
}

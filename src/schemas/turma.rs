use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Turma;
use crate::schemas::aluno::AlunoResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TurmaCreate {
    #[validate(range(min = 2000, max = 2100, message = "ano must be a plausible year"))]
    pub(crate) ano: i32,
    #[validate(length(min = 1, message = "materia must not be empty"))]
    pub(crate) materia: String,
    #[validate(length(min = 1, message = "curso must not be empty"))]
    pub(crate) curso: String,
    #[validate(range(min = 1, message = "periodo must be positive"))]
    pub(crate) periodo: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TurmaUpdate {
    #[serde(default)]
    #[validate(range(min = 2000, max = 2100, message = "ano must be a plausible year"))]
    pub(crate) ano: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, message = "materia must not be empty"))]
    pub(crate) materia: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "curso must not be empty"))]
    pub(crate) curso: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "periodo must be positive"))]
    pub(crate) periodo: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TurmaResponse {
    pub(crate) id: String,
    pub(crate) ano: i32,
    pub(crate) materia: String,
    pub(crate) curso: String,
    pub(crate) periodo: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TurmaResponse {
    pub(crate) fn from_db(turma: Turma) -> Self {
        Self {
            id: turma.id,
            ano: turma.ano,
            materia: turma.materia,
            curso: turma.curso,
            periodo: turma.periodo,
            created_at: format_primitive(turma.created_at),
            updated_at: format_primitive(turma.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TurmaDetailResponse {
    #[serde(flatten)]
    pub(crate) turma: TurmaResponse,
    pub(crate) alunos: Vec<AlunoResponse>,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Aluno;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AlunoCreate {
    #[validate(length(min = 1, message = "nome must not be empty"))]
    pub(crate) nome: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "matricula must not be empty"))]
    pub(crate) matricula: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AlunoUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "nome must not be empty"))]
    pub(crate) nome: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "matricula must not be empty"))]
    pub(crate) matricula: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AlunoResponse {
    pub(crate) id: String,
    pub(crate) nome: String,
    pub(crate) email: String,
    pub(crate) matricula: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AlunoResponse {
    pub(crate) fn from_db(aluno: Aluno) -> Self {
        Self {
            id: aluno.id,
            nome: aluno.nome,
            email: aluno.email,
            matricula: aluno.matricula,
            created_at: format_primitive(aluno.created_at),
            updated_at: format_primitive(aluno.updated_at),
        }
    }
}

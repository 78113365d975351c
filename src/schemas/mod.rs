use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod aluno;
pub(crate) mod auth;
pub(crate) mod correcao;
pub(crate) mod prova;
pub(crate) mod randomizacao;
pub(crate) mod turma;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) docs_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

pub(crate) mod alunos;
pub(crate) mod auth;
pub(crate) mod correcoes;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod pdf;
pub(crate) mod provas;
pub(crate) mod questoes;
pub(crate) mod randomizacao;
pub(crate) mod router;
pub(crate) mod turmas;
pub(crate) mod validation;

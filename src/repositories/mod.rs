pub(crate) mod alunos;
pub(crate) mod correcoes;
pub(crate) mod provas;
pub(crate) mod questoes;
pub(crate) mod randomizacoes;
pub(crate) mod turmas;
pub(crate) mod users;

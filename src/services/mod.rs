pub(crate) mod conteudo;
pub(crate) mod correcao;
pub(crate) mod export;
pub(crate) mod gabarito;
pub(crate) mod latex;
pub(crate) mod latex_compiler;
pub(crate) mod omr;
pub(crate) mod randomizacao;

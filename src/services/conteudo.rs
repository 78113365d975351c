//! In-memory view of a prova's questões and opções, assembled from the rows
//! the repositories return. Everything downstream (randomization, gabarito
//! resolution, LaTeX rendering) works on this shape instead of raw rows.

use std::collections::HashMap;

use crate::db::models::{Questao, QuestaoOpcao};

#[derive(Debug, Clone)]
pub(crate) struct OpcaoConteudo {
    pub(crate) text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestaoConteudo {
    pub(crate) id: String,
    pub(crate) text: String,
    /// Opções in authoring order; the index into this vector is the
    /// original choice index the stored permutations refer to.
    pub(crate) opcoes: Vec<OpcaoConteudo>,
}

/// Groups opções under their questões. `questoes` must already be sorted by
/// authoring order (the repository guarantees it); opções arrive sorted by
/// (questao_id, order) so pushing preserves the original choice order.
pub(crate) fn montar_questoes(
    questoes: Vec<Questao>,
    opcoes: Vec<QuestaoOpcao>,
) -> Vec<QuestaoConteudo> {
    let mut por_questao: HashMap<String, Vec<OpcaoConteudo>> = HashMap::new();
    for opcao in opcoes {
        por_questao
            .entry(opcao.questao_id)
            .or_default()
            .push(OpcaoConteudo { text: opcao.text, is_correct: opcao.is_correct });
    }

    questoes
        .into_iter()
        .map(|questao| QuestaoConteudo {
            opcoes: por_questao.remove(&questao.id).unwrap_or_default(),
            id: questao.id,
            text: questao.text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn questao(id: &str, order: i32) -> Questao {
        Questao {
            id: id.to_string(),
            prova_id: "prova-1".to_string(),
            order,
            text: format!("Questão {order}"),
            created_at: primitive_now_utc(),
        }
    }

    fn opcao(questao_id: &str, order: i32, is_correct: bool) -> QuestaoOpcao {
        QuestaoOpcao {
            id: format!("{questao_id}-op{order}"),
            questao_id: questao_id.to_string(),
            order,
            text: format!("Opção {order}"),
            is_correct,
            created_at: primitive_now_utc(),
        }
    }

    #[test]
    fn groups_opcoes_under_their_questoes() {
        let questoes = vec![questao("q1", 1), questao("q2", 2)];
        let opcoes = vec![
            opcao("q1", 1, false),
            opcao("q1", 2, true),
            opcao("q2", 1, true),
        ];

        let conteudo = montar_questoes(questoes, opcoes);

        assert_eq!(conteudo.len(), 2);
        assert_eq!(conteudo[0].id, "q1");
        assert_eq!(conteudo[0].opcoes.len(), 2);
        assert!(conteudo[0].opcoes[1].is_correct);
        assert_eq!(conteudo[1].opcoes.len(), 1);
    }

    #[test]
    fn questao_without_opcoes_gets_empty_vec() {
        let conteudo = montar_questoes(vec![questao("q1", 1)], Vec::new());
        assert_eq!(conteudo[0].opcoes.len(), 0);
    }
}

//! Per-student draw of the personalized question and choice orderings.
//!
//! Both stored permutations follow the forward convention: the value at
//! personalized position `p` is the original index of the item shown there.
//! The inverse direction (original index -> personalized position) is never
//! persisted; `gabarito` recomputes it on demand.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::services::conteudo::QuestaoConteudo;

#[derive(Debug, Clone)]
pub(crate) struct RandomizacaoSorteada {
    pub(crate) questoes_order: Vec<usize>,
    pub(crate) alternativas_order: HashMap<String, Vec<usize>>,
}

/// True when there is anything worth shuffling: at least one questão carrying
/// at least one opção. Linking a prova that fails this check is a client
/// error, not a trivially-empty success.
pub(crate) fn has_randomizable_content(questoes: &[QuestaoConteudo]) -> bool {
    questoes.iter().any(|questao| !questao.opcoes.is_empty())
}

/// Draws one independent randomization for a single student. Question order
/// and every per-question choice order are shuffled independently and
/// uniformly. Questões with zero opções keep an empty entry so the stored
/// mapping still covers every question id.
pub(crate) fn generate_randomizacao<R: Rng>(
    questoes: &[QuestaoConteudo],
    rng: &mut R,
) -> RandomizacaoSorteada {
    let mut questoes_order: Vec<usize> = (0..questoes.len()).collect();
    questoes_order.shuffle(rng);

    let mut alternativas_order = HashMap::with_capacity(questoes.len());
    for questao in questoes {
        let mut ordem: Vec<usize> = (0..questao.opcoes.len()).collect();
        ordem.shuffle(rng);
        alternativas_order.insert(questao.id.clone(), ordem);
    }

    RandomizacaoSorteada { questoes_order, alternativas_order }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conteudo::OpcaoConteudo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn questao(id: &str, opcoes: usize) -> QuestaoConteudo {
        QuestaoConteudo {
            id: id.to_string(),
            text: format!("Enunciado {id}"),
            opcoes: (0..opcoes)
                .map(|i| OpcaoConteudo { text: format!("Alternativa {i}"), is_correct: i == 0 })
                .collect(),
        }
    }

    fn assert_is_permutation(order: &[usize], len: usize) {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn permutations_cover_every_index_exactly_once() {
        let questoes =
            vec![questao("q1", 4), questao("q2", 5), questao("q3", 2), questao("q4", 3)];

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sorteio = generate_randomizacao(&questoes, &mut rng);

            assert_is_permutation(&sorteio.questoes_order, questoes.len());
            assert_eq!(sorteio.alternativas_order.len(), questoes.len());
            for questao in &questoes {
                assert_is_permutation(
                    &sorteio.alternativas_order[&questao.id],
                    questao.opcoes.len(),
                );
            }
        }
    }

    #[test]
    fn questao_without_opcoes_keeps_empty_entry() {
        let questoes = vec![questao("q1", 3), questao("q2", 0)];
        let mut rng = StdRng::seed_from_u64(7);

        let sorteio = generate_randomizacao(&questoes, &mut rng);

        assert!(sorteio.alternativas_order["q2"].is_empty());
        assert_is_permutation(&sorteio.alternativas_order["q1"], 3);
    }

    #[test]
    fn content_check_requires_at_least_one_opcao() {
        assert!(!has_randomizable_content(&[]));
        assert!(!has_randomizable_content(&[questao("q1", 0)]));
        assert!(has_randomizable_content(&[questao("q1", 0), questao("q2", 2)]));
    }
}

//! Recovers, for every personalized question number, the letter of the
//! objectively correct choice under that student's shuffling.

use std::collections::{BTreeMap, HashMap};

use crate::services::conteudo::QuestaoConteudo;

/// Inverse-maps a stored randomization back to correct letters.
///
/// `questoes` must be in authoring order; the stored permutations address
/// questions and choices by their index in that order. For each personalized
/// position `p` (reported 1-indexed) the correct choice's original index is
/// located inside `alternativas_order[questao_id]` by linear scan; the found
/// position `j` is the choice's personalized slot, so the letter is `'A' + j`.
///
/// Questões that cannot be resolved (no opção flagged correct, missing or
/// inconsistent permutation entries) are skipped with a warning so the rest
/// of the gabarito stays usable.
pub(crate) fn resolve_gabarito(
    questoes: &[QuestaoConteudo],
    questoes_order: &[usize],
    alternativas_order: &HashMap<String, Vec<usize>>,
) -> BTreeMap<usize, char> {
    let mut gabarito = BTreeMap::new();

    for (posicao, &original_index) in questoes_order.iter().enumerate() {
        let numero = posicao + 1;

        let Some(questao) = questoes.get(original_index) else {
            tracing::warn!(numero, original_index, "questoes_order points past the question list");
            continue;
        };

        let Some(correta_original) = questao.opcoes.iter().position(|opcao| opcao.is_correct)
        else {
            tracing::warn!(numero, questao_id = %questao.id, "questão has no opção flagged correct");
            continue;
        };

        let Some(ordem) = alternativas_order.get(&questao.id) else {
            tracing::warn!(numero, questao_id = %questao.id, "randomization has no entry for questão");
            continue;
        };

        let Some(j) = ordem.iter().position(|&original| original == correta_original) else {
            tracing::warn!(
                numero,
                questao_id = %questao.id,
                correta_original,
                "correct choice index missing from stored permutation"
            );
            continue;
        };

        if j >= 26 {
            tracing::warn!(numero, posicao_personalizada = j, "choice position beyond letter range");
            continue;
        }

        gabarito.insert(numero, (b'A' + j as u8) as char);
    }

    gabarito
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conteudo::OpcaoConteudo;

    fn questao(id: &str, opcoes: usize, correta: usize) -> QuestaoConteudo {
        QuestaoConteudo {
            id: id.to_string(),
            text: format!("Enunciado {id}"),
            opcoes: (0..opcoes)
                .map(|i| OpcaoConteudo { text: format!("Alternativa {i}"), is_correct: i == correta })
                .collect(),
        }
    }

    #[test]
    fn resolves_both_shuffles_back_to_letters() {
        // Q1 has 3 opções with original index 1 correct; Q2 has 2 with
        // original index 0 correct. The student sees them swapped.
        let questoes = vec![questao("q1", 3, 1), questao("q2", 2, 0)];
        let questoes_order = vec![1, 0];
        let alternativas_order = HashMap::from([
            ("q1".to_string(), vec![2, 0, 1]),
            ("q2".to_string(), vec![1, 0]),
        ]);

        let gabarito = resolve_gabarito(&questoes, &questoes_order, &alternativas_order);

        // Personalized 1 = original Q2: index 0 sits at slot 1 -> 'B'.
        // Personalized 2 = original Q1: index 1 sits at slot 2 -> 'C'.
        assert_eq!(gabarito, BTreeMap::from([(1, 'B'), (2, 'C')]));
    }

    #[test]
    fn identity_permutations_keep_original_letters() {
        let questoes = vec![questao("q1", 4, 2), questao("q2", 4, 0)];
        let questoes_order = vec![0, 1];
        let alternativas_order = HashMap::from([
            ("q1".to_string(), vec![0, 1, 2, 3]),
            ("q2".to_string(), vec![0, 1, 2, 3]),
        ]);

        let gabarito = resolve_gabarito(&questoes, &questoes_order, &alternativas_order);

        assert_eq!(gabarito, BTreeMap::from([(1, 'C'), (2, 'A')]));
    }

    #[test]
    fn forward_mapping_replay_matches_resolver() {
        // Replay the forward shuffle independently and check the inverse.
        let questoes = vec![questao("q1", 5, 3)];
        let ordem = vec![4, 3, 0, 2, 1];
        let alternativas_order = HashMap::from([("q1".to_string(), ordem.clone())]);

        let gabarito = resolve_gabarito(&questoes, &[0], &alternativas_order);

        let slot = ordem.iter().position(|&original| original == 3).unwrap();
        let esperado = (b'A' + slot as u8) as char;
        assert_eq!(gabarito[&1], esperado);
    }

    #[test]
    fn questao_without_correct_opcao_is_skipped() {
        let mut sem_correta = questao("q1", 3, 0);
        for opcao in &mut sem_correta.opcoes {
            opcao.is_correct = false;
        }
        let questoes = vec![sem_correta, questao("q2", 2, 1)];
        let alternativas_order = HashMap::from([
            ("q1".to_string(), vec![0, 1, 2]),
            ("q2".to_string(), vec![0, 1]),
        ]);

        let gabarito = resolve_gabarito(&questoes, &[0, 1], &alternativas_order);

        assert!(!gabarito.contains_key(&1));
        assert_eq!(gabarito[&2], 'B');
    }

    #[test]
    fn missing_permutation_entry_is_skipped() {
        let questoes = vec![questao("q1", 3, 1)];
        let gabarito = resolve_gabarito(&questoes, &[0], &HashMap::new());
        assert!(gabarito.is_empty());
    }
}

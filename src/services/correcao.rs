//! Grades the marks detected on a scanned answer sheet against the resolved
//! gabarito of that student. Pure bookkeeping; detection and resolution live
//! in [`super::omr`] and [`super::gabarito`].

use std::collections::BTreeMap;

use super::omr::BLANK_MARK;

/// One graded question. `esta_correta` stays `None` when the student left
/// the question blank or when no correct letter is known for it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RespostaAvaliada {
    pub(crate) questao_numero: usize,
    pub(crate) resposta_marcada: Option<String>,
    pub(crate) resposta_correta: Option<String>,
    pub(crate) esta_correta: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradeOutcome {
    pub(crate) nota: f64,
    pub(crate) total_questoes: usize,
    pub(crate) acertos: usize,
    pub(crate) respostas: Vec<RespostaAvaliada>,
}

/// Every detected question counts towards the total, whether or not it could
/// be graded. Marks compare case-insensitively; the nota is scaled to 0..10.
pub(crate) fn grade_respostas(
    detected: &BTreeMap<usize, String>,
    gabarito: &BTreeMap<usize, char>,
) -> GradeOutcome {
    let mut respostas = Vec::with_capacity(detected.len());
    let mut acertos = 0usize;

    for (&numero, mark) in detected {
        let mark = mark.trim();
        let marcada = (!mark.is_empty() && mark != BLANK_MARK).then(|| mark.to_string());
        let correta = gabarito.get(&numero).map(char::to_string);

        let esta_correta = match (&marcada, &correta) {
            (Some(marcada), Some(correta)) => Some(marcada.eq_ignore_ascii_case(correta)),
            _ => None,
        };
        if esta_correta == Some(true) {
            acertos += 1;
        }

        respostas.push(RespostaAvaliada {
            questao_numero: numero,
            resposta_marcada: marcada,
            resposta_correta: correta,
            esta_correta,
        });
    }

    let total_questoes = respostas.len();
    let nota = if total_questoes == 0 {
        0.0
    } else {
        acertos as f64 / total_questoes as f64 * 10.0
    };

    GradeOutcome { nota, total_questoes, acertos, respostas }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(marks: &[(usize, &str)]) -> BTreeMap<usize, String> {
        marks.iter().map(|&(numero, mark)| (numero, mark.to_string())).collect()
    }

    fn gabarito(letters: &[(usize, char)]) -> BTreeMap<usize, char> {
        letters.iter().copied().collect()
    }

    #[test]
    fn one_hit_out_of_two_scores_five() {
        let outcome =
            grade_respostas(&detected(&[(1, "B"), (2, "A")]), &gabarito(&[(1, 'B'), (2, 'C')]));
        assert_eq!(outcome.acertos, 1);
        assert_eq!(outcome.total_questoes, 2);
        assert_eq!(outcome.nota, 5.0);
        assert_eq!(outcome.respostas[0].esta_correta, Some(true));
        assert_eq!(outcome.respostas[1].esta_correta, Some(false));
    }

    #[test]
    fn marks_compare_case_insensitively() {
        let outcome = grade_respostas(&detected(&[(1, "b")]), &gabarito(&[(1, 'B')]));
        assert_eq!(outcome.acertos, 1);
        assert_eq!(outcome.nota, 10.0);
        assert_eq!(outcome.respostas[0].resposta_marcada.as_deref(), Some("b"));
    }

    #[test]
    fn blank_marks_grade_neither_right_nor_wrong() {
        let outcome = grade_respostas(&detected(&[(1, "?"), (2, "")]), &gabarito(&[(1, 'A')]));
        assert_eq!(outcome.acertos, 0);
        assert_eq!(outcome.total_questoes, 2);
        for resposta in &outcome.respostas {
            assert_eq!(resposta.resposta_marcada, None);
            assert_eq!(resposta.esta_correta, None);
        }
    }

    #[test]
    fn question_missing_from_gabarito_still_counts_in_total() {
        let outcome = grade_respostas(&detected(&[(1, "A"), (2, "B")]), &gabarito(&[(1, 'A')]));
        assert_eq!(outcome.total_questoes, 2);
        assert_eq!(outcome.acertos, 1);
        assert_eq!(outcome.nota, 5.0);
        assert_eq!(outcome.respostas[1].resposta_correta, None);
        assert_eq!(outcome.respostas[1].esta_correta, None);
    }

    #[test]
    fn empty_detection_scores_zero() {
        let outcome = grade_respostas(&BTreeMap::new(), &gabarito(&[(1, 'A')]));
        assert_eq!(outcome.total_questoes, 0);
        assert_eq!(outcome.nota, 0.0);
        assert!(outcome.respostas.is_empty());
    }
}

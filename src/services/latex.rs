//! Builds the LaTeX sources: the personalized exam body and the bubble-sheet
//! answer card (blank for students, filled for the gabarito). Only produces
//! strings; `latex_compiler` turns them into PDFs.

use std::collections::HashMap;

use crate::services::conteudo::QuestaoConteudo;

/// Personalized exam body for one student. Questions appear in
/// `questoes_order`; inside each question the opções follow that questão's
/// entry in `alternativas_order`. Permutation indices with no matching opção
/// are skipped. Literal `*` markers in stored text are stripped for display.
pub(crate) fn render_prova_content(
    prova_name: &str,
    questoes: &[QuestaoConteudo],
    questoes_order: &[usize],
    alternativas_order: &HashMap<String, Vec<usize>>,
) -> String {
    let mut latex = String::from(
        "\\documentclass[12pt,a4paper]{article}\n\
         \\usepackage[utf8]{inputenc}\n\
         \\usepackage[brazil]{babel}\n\
         \\usepackage[margin=2cm]{geometry}\n\
         \\usepackage{amsmath}\n\
         \\usepackage{amssymb}\n\
         \\usepackage{enumitem}\n\n",
    );
    latex.push_str(&format!("\\title{{{prova_name}}}\n\\date{{}}\n\n"));
    latex.push_str("\\begin{document}\n\n\\maketitle\n\n");

    for (posicao, &original_index) in questoes_order.iter().enumerate() {
        let Some(questao) = questoes.get(original_index) else {
            continue;
        };

        let texto = questao.text.replace('*', "");
        latex.push_str(&format!("\\textbf{{{}.}} {}\n\n", posicao + 1, texto.trim()));
        latex.push_str("\\begin{enumerate}[label=\\alph*)]\n");

        let ordem = alternativas_order.get(&questao.id).map(Vec::as_slice).unwrap_or(&[]);
        for &indice_original in ordem {
            if let Some(opcao) = questao.opcoes.get(indice_original) {
                let texto = opcao.text.replace('*', "");
                latex.push_str(&format!("\\item {}\n", texto.trim()));
            }
        }

        latex.push_str("\\end{enumerate}\n\n");
        latex.push_str("\\vspace{0.5cm}\n\n");
    }

    latex.push_str("\\end{document}");
    latex
}

/// One row of the bubble grid: the question number the student sees, how
/// many choices that question has, and (gabarito mode only) the resolved
/// correct letter.
#[derive(Debug, Clone)]
pub(crate) struct BubbleQuestion {
    pub(crate) number: usize,
    pub(crate) choices: usize,
    pub(crate) correct: Option<char>,
}

/// Blank answer card the students mark.
pub(crate) fn render_cartao_resposta(questoes: &[BubbleQuestion]) -> String {
    render_bubble_sheet(questoes, false)
}

/// Answer card with the correct bubble filled per question.
pub(crate) fn render_gabarito(questoes: &[BubbleQuestion]) -> String {
    render_bubble_sheet(questoes, true)
}

fn render_bubble_sheet(questoes: &[BubbleQuestion], is_answer_key: bool) -> String {
    let title = if is_answer_key { "GABARITO" } else { "CARTÃO RESPOSTA" };

    let mut latex = String::from(
        "\\documentclass[12pt,a4paper]{article}\n\
         \\usepackage[utf8]{inputenc}\n\
         \\usepackage[brazil]{babel}\n\
         \\usepackage[margin=2cm]{geometry}\n\
         \\usepackage{array}\n\
         \\usepackage{multirow}\n\
         \\usepackage{hhline}\n\
         \\usepackage{amssymb}\n\
         \\usepackage{wasysym}\n\n",
    );
    latex.push_str(&format!("\\title{{{title}}}\n\\author{{}}\n\\date{{}}\n\n"));
    latex.push_str("\\begin{document}\n\n");
    latex.push_str(&format!("\\begin{{center}}\n{{\\LARGE \\textbf{{{title}}}}}\n\\end{{center}}\n\n"));
    latex.push_str("\\vspace{0.5cm}\n\n");

    latex.push_str(
        "\\noindent\n\
         \\begin{tabular}{|p{6cm}|p{9cm}|}\n\
         \\hline\n\
         \\textbf{Nome:} & \\\\\n\
         \\hline\n\
         \\textbf{Matricula:} & \\\\\n\
         \\hline\n\
         \\textbf{Data:} & \\\\\n\
         \\hline\n\
         \\end{tabular}\n\n\
         \\vspace{1cm}\n\n",
    );

    latex.push_str(
        "\\noindent\n\
         \\textbf{Instruções:}\n\
         \\begin{itemize}\n\
         \\item Preencha completamente o círculo correspondente à alternativa escolhida\n\
         \\item Use caneta preta ou azul\n\
         \\item Não rasure o cartão\n\
         \\item Marque apenas uma alternativa por questão\n\
         \\end{itemize}\n\n\
         \\vspace{0.5cm}\n\n",
    );

    let max_choices =
        questoes.iter().map(|questao| questao.choices).max().unwrap_or(5).clamp(3, 10);
    let letters: Vec<char> = (0..max_choices).map(|i| (b'A' + i as u8) as char).collect();

    // Wider answer rows leave room for fewer question columns on the page.
    let question_columns = if max_choices <= 5 {
        3
    } else if max_choices <= 8 {
        2
    } else {
        1
    };
    let per_column = (questoes.len() + question_columns - 1) / question_columns;

    latex.push_str("\\begin{center}\n");
    let mut col_format = String::from("|");
    for _ in 0..question_columns {
        col_format.push_str("c|");
        for _ in 0..max_choices {
            col_format.push_str("c|");
        }
    }
    latex.push_str(&format!("\\begin{{tabular}}{{{col_format}}}\n"));
    latex.push_str("\\hline\n");

    let mut header = String::new();
    for col in 0..question_columns {
        if col > 0 {
            header.push_str(" & ");
        }
        header.push_str("\\textbf{Q}");
        for letter in &letters {
            header.push_str(&format!(" & \\textbf{{{letter}}}"));
        }
    }
    header.push_str(" \\\\\n");
    latex.push_str(&header);
    latex.push_str("\\hline\n");

    for row in 0..per_column {
        let mut line = String::new();
        for col in 0..question_columns {
            if col > 0 {
                line.push_str(" & ");
            }
            match questoes.get(col * per_column + row) {
                Some(questao) => {
                    line.push_str(&questao.number.to_string());
                    for i in 0..max_choices {
                        if i >= questao.choices {
                            line.push_str(" & ");
                            continue;
                        }
                        let filled = is_answer_key
                            && questao.correct.map_or(false, |letra| {
                                letra as usize == 'A' as usize + i
                            });
                        if filled {
                            line.push_str(" & $\\CIRCLE$");
                        } else {
                            line.push_str(" & $\\bigcirc$");
                        }
                    }
                }
                None => line.push_str(&" & ".repeat(max_choices)),
            }
        }
        line.push_str(" \\\\\n");
        latex.push_str(&line);
        latex.push_str("\\hline\n");
    }

    latex.push_str("\\end{tabular}\n\\end{center}\n\n");
    latex.push_str(
        "\\vspace{1cm}\n\n\
         \\noindent\n\
         \\textbf{Observações:}\n\
         \\begin{itemize}\n\
         \\item Confira se o número de questões corresponde ao da prova\n\
         \\item Em caso de dúvida, consulte o professor\n\
         \\end{itemize}\n\n\
         \\end{document}\n",
    );

    latex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conteudo::OpcaoConteudo;

    fn questao(id: &str, textos: &[&str]) -> QuestaoConteudo {
        QuestaoConteudo {
            id: id.to_string(),
            text: format!("Enunciado {id}"),
            opcoes: textos
                .iter()
                .map(|texto| OpcaoConteudo { text: texto.to_string(), is_correct: false })
                .collect(),
        }
    }

    #[test]
    fn exam_body_follows_personalized_order() {
        let questoes = vec![questao("q1", &["a1", "a2"]), questao("q2", &["b1", "b2"])];
        let alternativas_order = HashMap::from([
            ("q1".to_string(), vec![1, 0]),
            ("q2".to_string(), vec![0, 1]),
        ]);

        let latex = render_prova_content("Prova 1", &questoes, &[1, 0], &alternativas_order);

        let primeiro = latex.find("\\textbf{1.} Enunciado q2").unwrap();
        let segundo = latex.find("\\textbf{2.} Enunciado q1").unwrap();
        assert!(primeiro < segundo);

        // q1 alternatives come reversed at personalized position 2.
        let a2 = latex.find("\\item a2").unwrap();
        let a1 = latex.find("\\item a1").unwrap();
        assert!(a2 < a1);
    }

    #[test]
    fn exam_body_strips_asterisk_markers() {
        let mut marcada = questao("q1", &["*certa*", "errada"]);
        marcada.text = "Qual a *resposta*?".to_string();
        let alternativas_order = HashMap::from([("q1".to_string(), vec![0, 1])]);

        let latex = render_prova_content("Prova", &[marcada], &[0], &alternativas_order);

        assert!(latex.contains("Qual a resposta?"));
        assert!(latex.contains("\\item certa"));
        assert!(!latex.contains('*'));
    }

    #[test]
    fn exam_body_skips_out_of_range_choice_indices() {
        let questoes = vec![questao("q1", &["a1", "a2"])];
        // Index 5 has no opção behind it.
        let alternativas_order = HashMap::from([("q1".to_string(), vec![5, 1, 0])]);

        let latex = render_prova_content("Prova", &questoes, &[0], &alternativas_order);

        assert_eq!(latex.matches("\\item").count(), 2);
    }

    #[test]
    fn blank_sheet_has_no_filled_bubbles() {
        let questoes: Vec<BubbleQuestion> =
            (1..=6).map(|number| BubbleQuestion { number, choices: 4, correct: None }).collect();

        let latex = render_cartao_resposta(&questoes);

        assert!(latex.contains("CARTÃO RESPOSTA"));
        assert!(latex.contains("$\\bigcirc$"));
        assert!(!latex.contains("$\\CIRCLE$"));
    }

    #[test]
    fn gabarito_fills_exactly_the_resolved_bubbles() {
        let questoes = vec![
            BubbleQuestion { number: 1, choices: 4, correct: Some('B') },
            BubbleQuestion { number: 2, choices: 4, correct: Some('D') },
        ];

        let latex = render_gabarito(&questoes);

        assert!(latex.contains("GABARITO"));
        assert_eq!(latex.matches("$\\CIRCLE$").count(), 2);
    }

    #[test]
    fn letter_columns_clamp_to_at_least_three() {
        let questoes = vec![BubbleQuestion { number: 1, choices: 2, correct: None }];

        let latex = render_cartao_resposta(&questoes);

        assert!(latex.contains("\\textbf{C}"));
        assert!(!latex.contains("\\textbf{D}"));
    }

    #[test]
    fn narrow_grids_use_three_question_columns() {
        let questoes: Vec<BubbleQuestion> =
            (1..=10).map(|number| BubbleQuestion { number, choices: 5, correct: None }).collect();

        let latex = render_cartao_resposta(&questoes);

        assert_eq!(latex.matches("\\textbf{Q}").count(), 3);
    }

    #[test]
    fn wide_grids_collapse_to_a_single_question_column() {
        let questoes: Vec<BubbleQuestion> =
            (1..=4).map(|number| BubbleQuestion { number, choices: 9, correct: None }).collect();

        let latex = render_cartao_resposta(&questoes);

        assert_eq!(latex.matches("\\textbf{Q}").count(), 1);
    }
}

use std::collections::BTreeMap;

use tracing::info;

use crate::answer::AnswerSynthesizer;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub text: String,
}

/// Parses `ID=question` lines. Ids are zero-padded to two digits; blank
/// lines are skipped and a line without `=` is an error.
pub fn parse_questions(text: &str) -> Result<Vec<Question>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (id, question) = line
                .split_once('=')
                .ok_or_else(|| Error::Parse(format!("question line without '=': {}", line)))?;
            Ok(Question {
                id: format!("{:0>2}", id.trim()),
                text: question.trim().to_string(),
            })
        })
        .collect()
}

/// Answers every question against `content`, keyed by question id.
pub fn answer_all(
    answerer: &AnswerSynthesizer,
    content: &str,
    questions: &[Question],
) -> Result<BTreeMap<String, String>> {
    let mut answers = BTreeMap::new();
    for q in questions {
        let answer = answerer.answer(content, &q.text)?;
        info!(id = %q.id, question = %q.text, answer = %answer, "answered");
        answers.insert(q.id.clone(), answer);
    }
    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_ids_and_keeps_equals_in_question() {
        let parsed = parse_questions("1=Co to jest 2=2?\n\n12=Gdzie?\n").expect("parse");
        assert_eq!(
            parsed,
            vec![
                Question { id: "01".into(), text: "Co to jest 2=2?".into() },
                Question { id: "12".into(), text: "Gdzie?".into() },
            ]
        );
    }

    #[test]
    fn rejects_line_without_separator() {
        let err = parse_questions("01=ok\nbroken").expect_err("missing '='");
        assert!(err.to_string().contains("broken"));
    }
}

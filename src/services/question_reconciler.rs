//! Turns one loosely-shaped question record into a canonical question, or
//! rejects it. Nothing here touches the store.

use serde_json::Value;
use thiserror::Error;

use crate::core::config::ImportSettings;
use crate::services::key_resolver::{self, scalar_text, Resolved};

/// How many placeholder distractors to synthesize when a record names the
/// correct answer but offers no options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FallbackPolicy {
    pub(crate) placeholder_count: usize,
}

impl FallbackPolicy {
    pub(crate) fn quiz(settings: &ImportSettings) -> Self {
        Self { placeholder_count: settings.quiz_placeholder_options }
    }

    pub(crate) fn paper(settings: &ImportSettings) -> Self {
        Self { placeholder_count: settings.paper_placeholder_options }
    }

    fn placeholders(self) -> impl Iterator<Item = String> {
        (0..self.placeholder_count).map(|idx| format!("Option {} (placeholder)", idx + 2))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CanonicalQuestion {
    pub(crate) question_text: String,
    pub(crate) correct_option: String,
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum Rejection {
    #[error("record is not an object")]
    NotAnObject,
    #[error("missing question text")]
    MissingQuestionText,
    #[error("no answer derivable")]
    NoAnswerDerivable,
    #[error("fewer than two distinct options")]
    TooFewOptions,
}

impl Rejection {
    pub(crate) fn metric_label(self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingQuestionText => "missing_question_text",
            Self::NoAnswerDerivable => "no_answer_derivable",
            Self::TooFewOptions => "too_few_options",
        }
    }
}

pub(crate) fn reconcile(
    record: &Value,
    policy: FallbackPolicy,
) -> Result<CanonicalQuestion, Rejection> {
    let record = record.as_object().ok_or(Rejection::NotAnObject)?;
    let fields = key_resolver::resolve_question(record);

    let question_text = fields
        .question_text
        .value()
        .and_then(scalar_text)
        .ok_or(Rejection::MissingQuestionText)?;

    let mut options = match fields.options {
        Resolved::Present { value: Value::Array(items), .. } => {
            items.iter().filter_map(scalar_text).collect::<Vec<_>>()
        }
        _ => Vec::new(),
    };
    let declared = fields.correct_option.value().and_then(scalar_text);

    let correct_option = match declared {
        Some(correct) => {
            if options.is_empty() {
                options.push(correct.clone());
                options.extend(policy.placeholders());
            }
            correct
        }
        None => options.first().cloned().ok_or(Rejection::NoAnswerDerivable)?,
    };

    let mut distinct: Vec<String> = Vec::with_capacity(options.len() + 1);
    for option in options {
        if !distinct.contains(&option) {
            distinct.push(option);
        }
    }
    if !distinct.contains(&correct_option) {
        distinct.push(correct_option.clone());
    }

    if distinct.len() < 2 {
        return Err(Rejection::TooFewOptions);
    }

    Ok(CanonicalQuestion { question_text, correct_option, options: distinct })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const QUIZ: FallbackPolicy = FallbackPolicy { placeholder_count: 3 };
    const PAPER: FallbackPolicy = FallbackPolicy { placeholder_count: 2 };

    #[test]
    fn accepts_fully_specified_record() {
        let question = reconcile(
            &json!({"question": "2+2?", "options": ["3", "4"], "answer": "4"}),
            QUIZ,
        )
        .expect("accepted");
        assert_eq!(question.question_text, "2+2?");
        assert_eq!(question.correct_option, "4");
        assert_eq!(question.options, vec!["3", "4"]);
    }

    #[test]
    fn synthesizes_placeholders_when_options_missing() {
        let question =
            reconcile(&json!({"text": "Capital of France?", "correct": "Paris"}), QUIZ)
                .expect("accepted");
        assert_eq!(
            question.options,
            vec![
                "Paris",
                "Option 2 (placeholder)",
                "Option 3 (placeholder)",
                "Option 4 (placeholder)",
            ]
        );
        assert_eq!(question.correct_option, "Paris");
    }

    #[test]
    fn paper_policy_uses_fewer_placeholders() {
        let question = reconcile(&json!({"stem": "Largest planet?", "answer": "Jupiter"}), PAPER)
            .expect("accepted");
        assert_eq!(question.options.len(), 3);
    }

    #[test]
    fn first_option_stands_in_for_missing_answer() {
        let question =
            reconcile(&json!({"question": "Pick one", "choices": ["A", "B", "C"]}), QUIZ)
                .expect("accepted");
        assert_eq!(question.correct_option, "A");
        assert_eq!(question.options, vec!["A", "B", "C"]);
    }

    #[test]
    fn missing_answer_and_options_is_rejected() {
        let err = reconcile(&json!({"question": "Orphan"}), QUIZ).unwrap_err();
        assert_eq!(err, Rejection::NoAnswerDerivable);
        assert_eq!(err.to_string(), "no answer derivable");
    }

    #[test]
    fn missing_question_text_is_rejected() {
        let err = reconcile(&json!({"options": ["A", "B"], "answer": "A"}), QUIZ).unwrap_err();
        assert_eq!(err, Rejection::MissingQuestionText);

        let err = reconcile(&json!({"question": "   ", "answer": "A"}), QUIZ).unwrap_err();
        assert_eq!(err, Rejection::MissingQuestionText);
    }

    #[test]
    fn correct_answer_is_appended_when_not_offered() {
        let question =
            reconcile(&json!({"question": "Q", "options": ["A", "B"], "answer": "C"}), QUIZ)
                .expect("accepted");
        assert_eq!(question.options, vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_options_collapse_in_order() {
        let question = reconcile(
            &json!({"question": "Q", "options": ["B", "A", "B", "A"], "answer": "A"}),
            QUIZ,
        )
        .expect("accepted");
        assert_eq!(question.options, vec!["B", "A"]);
    }

    #[test]
    fn single_distinct_option_is_rejected() {
        let err = reconcile(&json!({"question": "Q", "options": ["A", "A"]}), QUIZ).unwrap_err();
        assert_eq!(err, Rejection::TooFewOptions);

        let none = FallbackPolicy { placeholder_count: 0 };
        let err = reconcile(&json!({"question": "Q", "answer": "A"}), none).unwrap_err();
        assert_eq!(err, Rejection::TooFewOptions);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = reconcile(&json!("just a string"), QUIZ).unwrap_err();
        assert_eq!(err, Rejection::NotAnObject);
    }

    #[test]
    fn accepted_questions_always_hold_their_answer_once() {
        let fixtures = [
            json!({"question": "a", "answer": "x"}),
            json!({"question": "b", "options": ["x", "y", "x"]}),
            json!({"question": "c", "options": ["y"], "correct_answer": "x"}),
            json!({"question_text": "d", "answers": [1, 2, 3], "correct_option": 2}),
            json!({"stem": "e", "options": ["", "x", null, "y"], "correct": "y"}),
        ];
        for fixture in &fixtures {
            let question = reconcile(fixture, QUIZ).expect("accepted");
            let hits = question.options.iter().filter(|o| **o == question.correct_option).count();
            assert_eq!(hits, 1, "fixture {fixture}");
            assert!(question.options.len() >= 2, "fixture {fixture}");
            assert!(!question.question_text.is_empty());
        }
    }
}

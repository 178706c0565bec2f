//! Grading of multiple-choice answers against their keys.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Verdict {
    CorrectAndChosen,
    CorrectNotChosen,
    IncorrectChosen,
    Unselected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Feedback {
    Excellent,
    Good,
    KeepStudying,
}

impl Feedback {
    pub(crate) fn for_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            Self::Excellent
        } else if percentage >= 60 {
            Self::Good
        } else {
            Self::KeepStudying
        }
    }
}

/// One question as the scorer sees it.
#[derive(Debug, Clone)]
pub(crate) struct AnswerKey {
    pub(crate) question_id: String,
    pub(crate) correct_option: String,
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OptionReview {
    pub(crate) option: String,
    pub(crate) verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionOutcome {
    pub(crate) question_id: String,
    pub(crate) selected_option: Option<String>,
    pub(crate) correct_option: String,
    pub(crate) is_correct: bool,
    pub(crate) verdict: Verdict,
    pub(crate) options: Vec<OptionReview>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScoreResult {
    pub(crate) score: u32,
    pub(crate) total: u32,
    pub(crate) percentage: u32,
    pub(crate) feedback: Feedback,
    pub(crate) per_question: Vec<QuestionOutcome>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScoreError {
    #[error("expected {expected} answers, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Rounds half up; an empty assessment scores 0%.
pub(crate) fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    ((200 * score + total) / (2 * total)) as u32
}

fn option_verdict(option: &str, correct: &str, selected: Option<&str>) -> Verdict {
    let chosen = selected == Some(option);
    match (option == correct, chosen) {
        (true, true) => Verdict::CorrectAndChosen,
        (true, false) => Verdict::CorrectNotChosen,
        (false, true) => Verdict::IncorrectChosen,
        (false, false) => Verdict::Unselected,
    }
}

/// `submitted` is positional: the n-th entry answers the n-th key, `None`
/// meaning the question was left blank.
pub(crate) fn grade(
    keys: &[AnswerKey],
    submitted: &[Option<String>],
) -> Result<ScoreResult, ScoreError> {
    if keys.len() != submitted.len() {
        return Err(ScoreError::LengthMismatch { expected: keys.len(), actual: submitted.len() });
    }

    let per_question = keys
        .iter()
        .zip(submitted)
        .map(|(key, selected)| {
            let selected = selected.as_deref();
            let is_correct = selected == Some(key.correct_option.as_str());
            let verdict = match selected {
                None => Verdict::Unselected,
                Some(_) if is_correct => Verdict::CorrectAndChosen,
                Some(_) => Verdict::IncorrectChosen,
            };
            QuestionOutcome {
                question_id: key.question_id.clone(),
                selected_option: selected.map(str::to_string),
                correct_option: key.correct_option.clone(),
                is_correct,
                verdict,
                options: key
                    .options
                    .iter()
                    .map(|option| OptionReview {
                        option: option.clone(),
                        verdict: option_verdict(option, &key.correct_option, selected),
                    })
                    .collect(),
            }
        })
        .collect::<Vec<_>>();

    let score = per_question.iter().filter(|outcome| outcome.is_correct).count() as u32;
    let total = keys.len() as u32;
    let percentage = percentage(score, total);

    Ok(ScoreResult {
        score,
        total,
        percentage,
        feedback: Feedback::for_percentage(percentage),
        per_question,
    })
}

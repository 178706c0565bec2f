//! Lookup of semantically-typed fields in untyped JSON records.
//!
//! Upstream producers disagree on key names, so every canonical field carries an
//! ordered list of accepted synonyms. Resolution never invents values: a field
//! whose synonyms are all missing resolves to [`Resolved::Absent`] and the
//! caller decides what a default should be.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShape {
    Any,
    /// Keys holding a non-array value are skipped and the scan moves on.
    List,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SynonymSet {
    pub(crate) field: &'static str,
    pub(crate) synonyms: &'static [&'static str],
    pub(crate) shape: FieldShape,
}

impl SynonymSet {
    pub(crate) const fn single(field: &'static str, synonyms: &'static [&'static str]) -> Self {
        Self { field, synonyms, shape: FieldShape::Any }
    }

    pub(crate) const fn list(field: &'static str, synonyms: &'static [&'static str]) -> Self {
        Self { field, synonyms, shape: FieldShape::List }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Resolved<'a> {
    Present { key: &'static str, value: &'a Value },
    Absent,
}

impl<'a> Resolved<'a> {
    pub(crate) fn value(self) -> Option<&'a Value> {
        match self {
            Self::Present { value, .. } => Some(value),
            Self::Absent => None,
        }
    }
}

pub(crate) const QUESTION_TEXT: SynonymSet =
    SynonymSet::single("question_text", &["question_text", "question", "text", "stem"]);

pub(crate) const CORRECT_OPTION: SynonymSet =
    SynonymSet::single("correct_option", &["correct_option", "correct", "answer", "correct_answer"]);

pub(crate) const OPTIONS: SynonymSet =
    SynonymSet::list("options", &["options", "choices", "answers"]);

pub(crate) fn resolve<'a>(record: &'a Map<String, Value>, set: &SynonymSet) -> Resolved<'a> {
    for &key in set.synonyms {
        let Some(value) = record.get(key) else {
            continue;
        };
        if set.shape == FieldShape::List && !value.is_array() {
            tracing::trace!(field = set.field, key, "Skipping non-list value for list field");
            continue;
        }
        return Resolved::Present { key, value };
    }

    Resolved::Absent
}

/// The three question fields, resolved independently of each other.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QuestionFields<'a> {
    pub(crate) question_text: Resolved<'a>,
    pub(crate) correct_option: Resolved<'a>,
    pub(crate) options: Resolved<'a>,
}

pub(crate) fn resolve_question(record: &Map<String, Value>) -> QuestionFields<'_> {
    QuestionFields {
        question_text: resolve(record, &QUESTION_TEXT),
        correct_option: resolve(record, &CORRECT_OPTION),
        options: resolve(record, &OPTIONS),
    }
}

/// Renders a scalar as trimmed text. Empty strings, nulls, arrays and objects
/// carry no usable text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object fixture")
    }

    #[test]
    fn first_synonym_in_priority_order_wins() {
        let record = record(json!({"stem": "later", "question": "earlier"}));
        let resolved = resolve(&record, &QUESTION_TEXT);
        assert_eq!(resolved, Resolved::Present { key: "question", value: &json!("earlier") });
    }

    #[test]
    fn missing_field_is_absent_not_defaulted() {
        let record = record(json!({"prompt": "What is 2+2?"}));
        assert_eq!(resolve(&record, &QUESTION_TEXT), Resolved::Absent);
        assert_eq!(resolve(&record, &CORRECT_OPTION).value(), None);
    }

    #[test]
    fn key_lookup_is_case_sensitive() {
        let record = record(json!({"Question": "2+2?", "ANSWER": "4"}));
        let fields = resolve_question(&record);
        assert_eq!(fields.question_text, Resolved::Absent);
        assert_eq!(fields.correct_option, Resolved::Absent);
    }

    #[test]
    fn list_fields_skip_non_array_values() {
        let record = record(json!({"options": "a, b", "choices": ["a", "b"]}));
        let resolved = resolve(&record, &OPTIONS);
        assert_eq!(resolved, Resolved::Present { key: "choices", value: &json!(["a", "b"]) });
    }

    #[test]
    fn null_value_still_counts_as_present() {
        let record = record(json!({"answer": null, "correct_answer": "4"}));
        let resolved = resolve(&record, &CORRECT_OPTION);
        assert_eq!(resolved, Resolved::Present { key: "answer", value: &Value::Null });
    }

    #[test]
    fn scalar_text_handles_numbers_and_blanks() {
        assert_eq!(scalar_text(&json!(4)), Some("4".to_string()));
        assert_eq!(scalar_text(&json!("  Paris ")), Some("Paris".to_string()));
        assert_eq!(scalar_text(&json!("   ")), None);
        assert_eq!(scalar_text(&json!(["x"])), None);
        assert_eq!(scalar_text(&Value::Null), None);
    }
}

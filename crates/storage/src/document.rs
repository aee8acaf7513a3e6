//! Boundary between loosely-typed stored documents and validated records.
//!
//! A document store hands back arbitrary field bags. Nothing past this module
//! reads fields by name: every document is converted into a `QuizRecord` or
//! `QuestionRecord` here, and a missing or mistyped required field is a
//! `StorageError::Serialization`.

use quiz_core::model::{QuestionRef, QuizId};
use serde_json::{Map, Value};

use crate::repository::{QuestionRecord, QuizRecord, StorageError};

/// A JSON object as stored in a document collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StorageError::Serialization(format!(
                "document must be an object, got {}",
                kind_of(&other)
            ))),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    fn field(&self, name: &'static str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    fn required_str(&self, name: &'static str) -> Result<String, StorageError> {
        match self.field(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(mistyped(name, "string", other)),
            None => Err(missing(name)),
        }
    }

    fn optional_str(&self, name: &'static str) -> Result<Option<String>, StorageError> {
        match self.field(name) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mistyped(name, "string", other)),
            None => Ok(None),
        }
    }

    fn required_str_array(&self, name: &'static str) -> Result<Vec<String>, StorageError> {
        let Some(value) = self.field(name) else {
            return Err(missing(name));
        };
        let Value::Array(items) = value else {
            return Err(mistyped(name, "array", value));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(mistyped(name, "array of strings", other)),
            })
            .collect()
    }

    fn optional_u32(&self, name: &'static str) -> Result<Option<u32>, StorageError> {
        let Some(value) = self.field(name) else {
            return Ok(None);
        };
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| mistyped(name, "non-negative integer", value))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn missing(name: &'static str) -> StorageError {
    StorageError::Serialization(format!("missing required field `{name}`"))
}

fn mistyped(name: &'static str, expected: &'static str, got: &Value) -> StorageError {
    StorageError::Serialization(format!(
        "field `{name}` must be {expected}, got {}",
        kind_of(got)
    ))
}

fn parse_ref(raw: String) -> Result<QuestionRef, StorageError> {
    raw.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid question reference: {raw:?}")))
}

impl QuizRecord {
    /// Validate a quiz document.
    ///
    /// Required: `topic` (string), `questions` (array of question ids).
    /// Optional: `totalPoints` (non-negative integer), `subject` (string).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on a missing or mistyped field.
    pub fn from_document(id: QuizId, doc: &Document) -> Result<Self, StorageError> {
        let topic = doc.required_str("topic")?;
        let question_refs = doc
            .required_str_array("questions")?
            .into_iter()
            .map(parse_ref)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            topic,
            subject: doc.optional_str("subject")?,
            question_refs,
            total_points: doc.optional_u32("totalPoints")?,
        })
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut fields = Map::new();
        fields.insert("topic".into(), Value::String(self.topic.clone()));
        fields.insert(
            "questions".into(),
            Value::Array(
                self.question_refs
                    .iter()
                    .map(|r| Value::String(r.as_str().to_owned()))
                    .collect(),
            ),
        );
        if let Some(subject) = &self.subject {
            fields.insert("subject".into(), Value::String(subject.clone()));
        }
        if let Some(total) = self.total_points {
            fields.insert("totalPoints".into(), Value::from(total));
        }
        Document { fields }
    }
}

impl QuestionRecord {
    /// Validate a question document.
    ///
    /// Required: `question`, `options`, `correctAnswer`. Optional: `points`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on a missing or mistyped field.
    pub fn from_document(id: QuestionRef, doc: &Document) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            prompt: doc.required_str("question")?,
            options: doc.required_str_array("options")?,
            correct_answer: doc.required_str("correctAnswer")?,
            points: doc.optional_u32("points")?,
        })
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut fields = Map::new();
        fields.insert("question".into(), Value::String(self.prompt.clone()));
        fields.insert(
            "options".into(),
            Value::Array(self.options.iter().cloned().map(Value::String).collect()),
        );
        fields.insert(
            "correctAnswer".into(),
            Value::String(self.correct_answer.clone()),
        );
        if let Some(points) = self.points {
            fields.insert("points".into(), Value::from(points));
        }
        Document { fields }
    }
}

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    Error,
    Result,
};
use crate::types::PendingRequest;

/// Well-known name of the clarifying-question capability.
pub const ASK_QUESTION: &str = "askQuestion";

/// The structured payload of one clarifying question.
///
/// This is the only boundary format the loops define. It must round-trip
/// through the generator's untyped interrupt metadata without loss: question
/// text and choice order are preserved exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionPayload {
    /// The clarifying question to put to the user
    pub question: String,
    /// Choices to display alongside the question, in presentation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl QuestionPayload {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Decodes the untyped payload carried by a pending request.
    ///
    /// Fails closed: any unexpected shape aborts the dialog with
    /// [Error::MalformedPendingRequest] rather than guessing at a question.
    pub fn decode(request: &PendingRequest) -> Result<Self> {
        if !request.input.is_object() {
            return Err(Error::MalformedPendingRequest {
                request_id: request.id.clone(),
                reason: format!("expected an object payload, got {}", json_type_name(&request.input)),
            });
        }
        serde_json::from_value(request.input.clone()).map_err(|err| Error::MalformedPendingRequest {
            request_id: request.id.clone(),
            reason: err.to_string(),
        })
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

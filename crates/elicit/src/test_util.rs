//! Scripted collaborator doubles for exercising the loops without a real
//! generation engine or console.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::error::{
    Error,
    Result,
};
use crate::generator::{
    Capability,
    GenerateInput,
    GenerateRequest,
    Generator,
};
use crate::interaction::Interaction;
use crate::protocol::{
    ASK_QUESTION,
    QuestionPayload,
};
use crate::types::{
    Message,
    ModelResponse,
    PendingRequest,
};

/// Builds a pending request carrying a well-formed question payload.
pub fn question_request(id: &str, question: &str, choices: &[&str]) -> PendingRequest {
    let input = if choices.is_empty() {
        json!({ "question": question })
    } else {
        json!({ "question": question, "choices": choices })
    };
    PendingRequest {
        id: id.to_string(),
        capability: ASK_QUESTION.to_string(),
        input,
    }
}

/// A record of one generation call received by [ScriptedGenerator].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    /// Names of the capabilities attached to the call
    pub capabilities: Vec<String>,
    pub input: GenerateInput,
}

/// A [Generator] that replays queued responses and verdicts while recording
/// every call it receives.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    capabilities: Vec<String>,
    responses: Mutex<VecDeque<ModelResponse>>,
    verdicts: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<RecordedCall>>,
    evaluations: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.push(name.into());
        self
    }

    /// Queues the response returned by the next generation call.
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Queues the verdict returned by the next boolean evaluation.
    pub fn with_verdict(self, verdict: bool) -> Self {
        self.verdicts.lock().unwrap().push_back(verdict);
        self
    }

    /// Every generation call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The prompt of every boolean evaluation received so far, in order.
    pub fn evaluations(&self) -> Vec<String> {
        self.evaluations.lock().unwrap().clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("the script ran out of {0}")]
struct ScriptExhausted(&'static str);

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, cancel: &CancellationToken, request: GenerateRequest) -> Result<ModelResponse> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.calls.lock().unwrap().push(RecordedCall {
            messages: request.messages,
            capabilities: request.capabilities.iter().map(|c| c.name().to_string()).collect(),
            input: request.input,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::generation(ScriptExhausted("responses")))
    }

    fn lookup_capability(&self, name: &str) -> Option<Capability> {
        self.capabilities
            .iter()
            .any(|c| c == name)
            .then(|| Capability::new(name))
    }

    async fn evaluate_bool(&self, cancel: &CancellationToken, prompt: &str, _history: &[Message]) -> Result<bool> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.evaluations.lock().unwrap().push(prompt.to_string());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::generation(ScriptExhausted("verdicts")))
    }
}

/// An [Interaction] that replays queued answers and records every question it
/// was asked. Running out of answers surfaces as [Error::Timeout], the same
/// way an unattended console would fail.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<QuestionPayload>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        self.answers.lock().unwrap().push_back(answer.into());
        self
    }

    /// Every question asked so far, in order.
    pub fn questions(&self) -> Vec<QuestionPayload> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn ask(&self, cancel: &CancellationToken, question: &QuestionPayload) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.questions.lock().unwrap().push(question.clone());
        self.answers.lock().unwrap().pop_front().ok_or(Error::Timeout)
    }
}

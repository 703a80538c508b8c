use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{
    Answer,
    Message,
    ModelResponse,
    PendingRequest,
};

/// A typed handle to a named capability registered with a [Generator].
///
/// Lookup returns an explicit [Option] rather than a nullable reference so
/// callers are forced to handle absence before entering a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    name: String,
}

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds an answer to the pending request it resolves.
    pub fn respond(&self, request: &PendingRequest, value: impl Into<String>) -> Answer {
        debug_assert_eq!(request.capability, self.name);
        Answer {
            request_id: request.id.clone(),
            value: value.into(),
        }
    }
}

/// What a generation call should produce from.
#[derive(Debug, Clone)]
pub enum GenerateInput {
    /// A fresh prompt opening or extending the dialog
    Prompt {
        system: Option<String>,
        user: String,
    },
    /// Answers resolving every pending request of the prior suspended
    /// response
    Resume(Vec<Answer>),
}

/// Arguments for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Prior conversation history, in order
    pub messages: Vec<Message>,
    /// Capabilities made available to the engine for this call
    pub capabilities: Vec<Capability>,
    pub input: GenerateInput,
}

impl GenerateRequest {
    /// An initial or follow-up generation call seeded with a prompt.
    pub fn prompt(
        messages: Vec<Message>,
        capabilities: Vec<Capability>,
        system: Option<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            messages,
            capabilities,
            input: GenerateInput::Prompt {
                system,
                user: user.into(),
            },
        }
    }

    /// A resumption call supplying answers to all pending requests of the
    /// prior response.
    pub fn resume(messages: Vec<Message>, capability: Capability, answers: Vec<Answer>) -> Self {
        Self {
            messages,
            capabilities: vec![capability],
            input: GenerateInput::Resume(answers),
        }
    }
}

/// The generation engine the loops drive. Implementations own the
/// conversation history; the loops only observe the snapshot carried by each
/// response.
///
/// Every operation must observe the cancellation token and return promptly
/// once it fires rather than complete a stale call.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces one response. Suspended responses must carry their pending
    /// requests as structured data, never prose.
    async fn generate(&self, cancel: &CancellationToken, request: GenerateRequest) -> Result<ModelResponse>;

    /// Resolves a named capability, or [None] when it was never registered.
    fn lookup_capability(&self, name: &str) -> Option<Capability>;

    /// A closed yes/no classification over the conversation history.
    ///
    /// Expected to be stable enough not to oscillate pathologically, though
    /// determinism is not mandated.
    async fn evaluate_bool(&self, cancel: &CancellationToken, prompt: &str, history: &[Message]) -> Result<bool>;
}

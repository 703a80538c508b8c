use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One unit of required external input carried by a suspended response.
///
/// The payload is the generator's untyped interrupt metadata; it is decoded
/// into a typed shape at the boundary (see [crate::protocol::QuestionPayload]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    /// Identifier binding this request to the answer that resolves it
    pub id: String,
    /// Name of the capability the engine invoked to suspend
    pub capability: String,
    /// Untyped invocation payload
    pub input: serde_json::Value,
}

/// Resolves exactly one [PendingRequest]. Built via
/// [crate::generator::Capability::respond], consumed when assembling the
/// resumption call, and not retained afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub request_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
    CapabilityUse(PendingRequest),
    CapabilityResult(Answer),
}

/// One turn of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::Text(text.into())])
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::Text(text.into())])
    }

    /// Returns only the text content, joined as a single string.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseState {
    /// Generation cannot proceed without external input
    Suspended,
    /// Generation reached a terminal state
    Finished,
}

/// The result of one generation call.
///
/// Immutable once produced; a resumption call supersedes it with a new
/// response. The history snapshot it carries is owned by the generator and
/// only ever observed here.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    state: ResponseState,
    pending_requests: Vec<PendingRequest>,
    history: Vec<Message>,
}

impl ModelResponse {
    /// A terminal response carrying no pending requests.
    pub fn finished(history: Vec<Message>) -> Self {
        Self {
            state: ResponseState::Finished,
            pending_requests: Vec::new(),
            history,
        }
    }

    /// A response that cannot proceed without the given requests being
    /// resolved.
    pub fn suspended(history: Vec<Message>, pending_requests: Vec<PendingRequest>) -> Self {
        Self {
            state: ResponseState::Suspended,
            pending_requests,
            history,
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn is_suspended(&self) -> bool {
        self.state == ResponseState::Suspended
    }

    /// Pending requests in the order the engine presented them.
    pub fn pending_requests(&self) -> &[PendingRequest] {
        &self.pending_requests
    }

    /// The history snapshot this response was generated against, including
    /// the response's own message.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// The terminal text of the response, possibly empty.
    pub fn text(&self) -> String {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(Message::text)
            .unwrap_or_default()
    }
}

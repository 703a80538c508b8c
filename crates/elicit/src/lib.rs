//! Suspend/resume clarification loops for conversational generation.
//!
//! A generation call can terminate suspended, carrying pending requests that
//! an external actor (typically a human at a console) must resolve before
//! generation can continue. [InterruptResolver] drives one round of
//! suspension to a finished response; [ConversationLoop] wraps it with a
//! completion gate that decides whether the dialog has gathered enough
//! information to stop, forcing another information-gathering round when it
//! has not.
//!
//! The generation engine itself is an external collaborator behind the
//! [Generator] trait, as is the human behind [Interaction].

pub mod agent;
pub mod completion;
pub mod error;
pub mod generator;
pub mod interaction;
pub mod protocol;
pub mod resolution;
pub mod test_util;
pub mod types;

pub use agent::{
    AgentOptions,
    ResponseHandler,
    run_agent,
};
pub use completion::ConversationLoop;
pub use error::{
    Error,
    Result,
};
pub use generator::{
    Capability,
    GenerateInput,
    GenerateRequest,
    Generator,
};
pub use interaction::Interaction;
pub use interaction::terminal::TerminalInteraction;
pub use protocol::{
    ASK_QUESTION,
    QuestionPayload,
};
pub use resolution::InterruptResolver;
pub use types::{
    Answer,
    ContentBlock,
    Message,
    ModelResponse,
    PendingRequest,
    ResponseState,
    Role,
};

use std::io;

/// Errors surfaced by the clarification loops.
///
/// None of these are recovered locally: every error aborts the current dialog
/// and is returned to the caller unchanged. There is no retry policy and no
/// partial-answer mode.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A capability the dialog depends on was never registered with the
    /// generator. Raised before any generation or interaction call is made.
    #[error("the {0} capability is not registered with the generator")]
    CapabilityNotFound(String),

    /// The surrounding cancellation token fired.
    #[error("the operation was cancelled")]
    Cancelled,

    /// The interaction boundary gave up waiting for an answer. Only raised
    /// by interaction implementations, never by the loops themselves.
    #[error("no answer was provided before the response deadline")]
    Timeout,

    /// A pending request's payload could not be decoded into the expected
    /// question shape. The loop aborts rather than guess.
    #[error("pending request {request_id} carries a malformed payload: {reason}")]
    MalformedPendingRequest { request_id: String, reason: String },

    /// An opaque upstream failure from the generator.
    #[error("the generator failed to produce a response")]
    Generation(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The configured bound on information-gathering rounds was exhausted
    /// before the completion verdict turned true.
    #[error("exceeded the configured limit of {rounds} clarification rounds")]
    RoundLimit { rounds: u32 },

    /// The interaction boundary's input source failed or closed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Wraps an upstream generator failure.
    pub fn generation<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Generation(Box::new(source))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

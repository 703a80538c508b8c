pub mod terminal;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::protocol::QuestionPayload;

/// The external actor that resolves pending requests — typically a human.
///
/// `ask` may block indefinitely from the loops' perspective; enforcing a
/// response deadline is the implementation's responsibility, surfaced as
/// [crate::Error::Timeout] (distinct from [crate::Error::Cancelled]). Once
/// the cancellation token fires, implementations must return promptly.
#[async_trait]
pub trait Interaction: Send + Sync {
    async fn ask(&self, cancel: &CancellationToken, question: &QuestionPayload) -> Result<String>;
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    warn,
};

use crate::agent::ResponseHandler;
use crate::error::{
    Error,
    Result,
};
use crate::generator::{
    GenerateRequest,
    Generator,
};
use crate::interaction::Interaction;
use crate::protocol::{
    ASK_QUESTION,
    QuestionPayload,
};
use crate::types::{
    Answer,
    ModelResponse,
};

/// Drives a possibly-suspended response to a finished one.
///
/// Every pending request of a suspended response is put to the interaction
/// boundary in presentation order, and all answers are fed back in a single
/// resumption call. Requests are never fanned out: answer order must match
/// request order, and the interaction may be one shared console.
pub struct InterruptResolver {
    generator: Arc<dyn Generator>,
    interaction: Arc<dyn Interaction>,
}

impl InterruptResolver {
    pub fn new(generator: Arc<dyn Generator>, interaction: Arc<dyn Interaction>) -> Self {
        Self { generator, interaction }
    }

    /// Resolves `response` until it is no longer suspended.
    ///
    /// A response is never resumed with a partial answer set: any failure
    /// while collecting answers aborts the whole operation, discarding the
    /// answers gathered for the current round.
    pub async fn resolve(&self, cancel: &CancellationToken, mut response: ModelResponse) -> Result<ModelResponse> {
        let ask_question = self
            .generator
            .lookup_capability(ASK_QUESTION)
            .ok_or_else(|| Error::CapabilityNotFound(ASK_QUESTION.to_string()))?;

        while response.is_suspended() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if response.pending_requests().is_empty() {
                warn!("suspended response carries no pending requests, resuming with no answers");
            }

            let mut answers: Vec<Answer> = Vec::with_capacity(response.pending_requests().len());
            for request in response.pending_requests() {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let payload = QuestionPayload::decode(request)?;
                debug!(request_id = %request.id, "collecting an answer for a pending request");
                let value = self.interaction.ask(cancel, &payload).await?;
                answers.push(ask_question.respond(request, value));
            }

            debug!(answers = answers.len(), "resuming generation with the collected answers");
            let request = GenerateRequest::resume(response.history().to_vec(), ask_question.clone(), answers);
            response = self.generator.generate(cancel, request).await?;
        }

        Ok(response)
    }
}

#[async_trait]
impl ResponseHandler for InterruptResolver {
    async fn handle(&self, cancel: &CancellationToken, response: ModelResponse) -> Result<ModelResponse> {
        self.resolve(cancel, response).await
    }
}

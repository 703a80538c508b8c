use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::agent::ResponseHandler;
use crate::error::{
    Error,
    Result,
};
use crate::generator::{
    GenerateRequest,
    Generator,
};
use crate::protocol::ASK_QUESTION;
use crate::resolution::InterruptResolver;
use crate::types::ModelResponse;

/// Wraps the resolution loop with a finish/continue decision.
///
/// After each fully-resolved response the generator is asked a closed yes/no
/// completeness question over the accumulated history. A "no" provokes one
/// more information-gathering round, seeded from the text of the response
/// that was just resolved. The loop never terminates while the latest
/// response is still suspended.
pub struct ConversationLoop {
    generator: Arc<dyn Generator>,
    resolver: InterruptResolver,
    validation_prompt: String,
    /// Bound on information-gathering rounds. [None] means unbounded, which
    /// trusts the boolean evaluation to eventually turn true.
    round_cap: Option<NonZeroU32>,
}

impl ConversationLoop {
    pub fn new(generator: Arc<dyn Generator>, resolver: InterruptResolver, validation_prompt: impl Into<String>) -> Self {
        Self {
            generator,
            resolver,
            validation_prompt: validation_prompt.into(),
            round_cap: None,
        }
    }

    /// Caps the number of extra information-gathering rounds; exhausting the
    /// cap fails the dialog with [Error::RoundLimit].
    pub fn with_round_cap(mut self, round_cap: NonZeroU32) -> Self {
        self.round_cap = Some(round_cap);
        self
    }

    /// Runs `response` to a completion-judged finished response.
    pub async fn run(&self, cancel: &CancellationToken, mut response: ModelResponse) -> Result<ModelResponse> {
        let ask_question = self
            .generator
            .lookup_capability(ASK_QUESTION)
            .ok_or_else(|| Error::CapabilityNotFound(ASK_QUESTION.to_string()))?;

        let mut rounds: u32 = 0;
        loop {
            response = self.resolver.resolve(cancel, response).await?;

            let finished = self
                .generator
                .evaluate_bool(cancel, &self.validation_prompt, response.history())
                .await?;
            if finished {
                debug!(rounds, "conversation judged complete");
                return Ok(response);
            }

            rounds += 1;
            if let Some(cap) = self.round_cap {
                if rounds > cap.get() {
                    return Err(Error::RoundLimit { rounds: cap.get() });
                }
            }

            debug!(rounds, "conversation judged incomplete, provoking another round");
            let request = GenerateRequest::prompt(
                response.history().to_vec(),
                vec![ask_question.clone()],
                None,
                follow_up_prompt(&response.text()),
            );
            response = self.generator.generate(cancel, request).await?;
        }
    }
}

#[async_trait]
impl ResponseHandler for ConversationLoop {
    async fn handle(&self, cancel: &CancellationToken, response: ModelResponse) -> Result<ModelResponse> {
        self.run(cancel, response).await
    }
}

/// Seeds the next information-gathering round from the text of the response
/// that was just resolved.
///
/// Kept as its own transformation so the coupling between the generator's
/// free text and the next prompt can be swapped or tested independently.
pub fn follow_up_prompt(resolved_text: &str) -> String {
    let resolved_text = resolved_text.trim();
    if resolved_text.is_empty() {
        "The conversation is still missing information. Use the askQuestion capability to ask the user a clarifying \
         question."
            .to_string()
    } else {
        format!(
            "Your last answer was:\n\n{resolved_text}\n\nThe conversation is still missing information. Use the \
             askQuestion capability to ask the user a clarifying question."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerateInput;
    use crate::test_util::{
        ScriptedGenerator,
        ScriptedInteraction,
        question_request,
    };
    use crate::types::Message;

    const VALIDATION_PROMPT: &str = "Does the conversation contain enough information for a final answer?";

    fn conversation_loop(generator: Arc<ScriptedGenerator>, interaction: Arc<ScriptedInteraction>) -> ConversationLoop {
        let resolver = InterruptResolver::new(generator.clone(), interaction);
        ConversationLoop::new(generator, resolver, VALIDATION_PROMPT)
    }

    #[tokio::test]
    async fn true_verdict_returns_the_resolved_response_as_is() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .with_capability(ASK_QUESTION)
                .with_verdict(true),
        );
        let interaction = Arc::new(ScriptedInteraction::new());
        let response = ModelResponse::finished(vec![Message::assistant_text("all set")]);

        let result = conversation_loop(generator.clone(), interaction)
            .run(&CancellationToken::new(), response)
            .await
            .unwrap();

        assert_eq!(result.text(), "all set");
        assert_eq!(generator.calls().len(), 0);
        assert_eq!(generator.evaluations().len(), 1);
        assert_eq!(generator.evaluations()[0], VALIDATION_PROMPT);
    }

    #[tokio::test]
    async fn false_then_true_takes_two_rounds_and_two_evaluations() {
        // Round one: the incoming response is suspended, resolution resumes
        // it (generation call #1), the verdict is false, so a follow-up
        // generation call (#2) opens round two. Round two resolves trivially
        // and the second verdict ends the dialog.
        let suspended = ModelResponse::suspended(vec![Message::user_text("gifts")], vec![question_request(
            "req-1",
            "What gender are the children?",
            &["Boy", "Girl", "Both"],
        )]);
        let generator = Arc::new(
            ScriptedGenerator::new()
                .with_capability(ASK_QUESTION)
                .with_response(ModelResponse::finished(vec![Message::assistant_text("partial answer")]))
                .with_response(ModelResponse::finished(vec![Message::assistant_text("full answer")]))
                .with_verdict(false)
                .with_verdict(true),
        );
        let interaction = Arc::new(ScriptedInteraction::new().with_answer("Boy"));

        let result = conversation_loop(generator.clone(), interaction)
            .run(&CancellationToken::new(), suspended)
            .await
            .unwrap();

        assert_eq!(result.text(), "full answer");
        assert_eq!(generator.evaluations().len(), 2);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0].input, GenerateInput::Resume(_)));
        match &calls[1].input {
            GenerateInput::Prompt { system, user } => {
                assert!(system.is_none());
                assert!(user.contains("partial answer"), "follow-up prompt should seed from the resolved text");
            },
            other => panic!("expected a prompt call, got {other:?}"),
        }
        assert_eq!(calls[1].capabilities, vec![ASK_QUESTION.to_string()]);
    }

    #[tokio::test]
    async fn missing_capability_is_fatal_before_any_call() {
        let generator = Arc::new(ScriptedGenerator::new().with_verdict(true));
        let interaction = Arc::new(ScriptedInteraction::new());
        let response = ModelResponse::finished(vec![Message::assistant_text("done")]);

        let err = conversation_loop(generator.clone(), interaction)
            .run(&CancellationToken::new(), response)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CapabilityNotFound(_)));
        assert_eq!(generator.calls().len(), 0);
        assert_eq!(generator.evaluations().len(), 0);
    }

    #[tokio::test]
    async fn resolution_errors_propagate_unchanged() {
        let generator = Arc::new(ScriptedGenerator::new().with_capability(ASK_QUESTION));
        // No scripted answer: resolution fails before any verdict is taken.
        let interaction = Arc::new(ScriptedInteraction::new());
        let suspended = ModelResponse::suspended(vec![], vec![question_request("req-1", "q", &[])]);

        let err = conversation_loop(generator.clone(), interaction)
            .run(&CancellationToken::new(), suspended)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout));
        assert_eq!(generator.evaluations().len(), 0);
    }

    #[tokio::test]
    async fn round_cap_exhaustion_fails_the_dialog() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .with_capability(ASK_QUESTION)
                .with_response(ModelResponse::finished(vec![Message::assistant_text("round one")]))
                .with_response(ModelResponse::finished(vec![Message::assistant_text("round two")]))
                .with_verdict(false)
                .with_verdict(false)
                .with_verdict(false),
        );
        let interaction = Arc::new(ScriptedInteraction::new());
        let resolver = InterruptResolver::new(generator.clone(), interaction);
        let conversation = ConversationLoop::new(generator.clone(), resolver, VALIDATION_PROMPT)
            .with_round_cap(NonZeroU32::new(2).unwrap());
        let response = ModelResponse::finished(vec![Message::assistant_text("start")]);

        let err = conversation
            .run(&CancellationToken::new(), response)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RoundLimit { rounds: 2 }));
        assert_eq!(generator.calls().len(), 2);
        assert_eq!(generator.evaluations().len(), 3);
    }

    #[test]
    fn follow_up_prompt_embeds_the_resolved_text() {
        let prompt = follow_up_prompt("I recommend LEGO sets.");
        assert!(prompt.contains("I recommend LEGO sets."));
        assert!(prompt.contains("askQuestion"));
    }

    #[test]
    fn follow_up_prompt_handles_empty_text() {
        let prompt = follow_up_prompt("   ");
        assert!(!prompt.contains("Your last answer"));
        assert!(prompt.contains("askQuestion"));
    }
}

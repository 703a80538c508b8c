use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{
    Error,
    Result,
};
use crate::generator::{
    Capability,
    GenerateRequest,
    Generator,
};
use crate::types::ModelResponse;

/// Drives a response to one the caller can accept, possibly issuing further
/// generation calls along the way.
///
/// Implemented by [crate::InterruptResolver] (suspend/resume only) and
/// [crate::ConversationLoop] (suspend/resume plus a completion gate).
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn handle(&self, cancel: &CancellationToken, response: ModelResponse) -> Result<ModelResponse>;
}

/// Configuration for one dialog run.
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// Names of capabilities to resolve and attach to the initial call
    pub capability_names: Vec<String>,
}

impl AgentOptions {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_capability(mut self, name: impl Into<String>) -> Self {
        self.capability_names.push(name.into());
        self
    }
}

/// Runs one dialog: issues the initial generation call, hands the response
/// to `handler` if one is given, and returns the final response's text.
///
/// Every named capability is resolved up front; absence is a fatal
/// configuration error raised before any generation call.
pub async fn run_agent(
    cancel: &CancellationToken,
    generator: &dyn Generator,
    options: &AgentOptions,
    handler: Option<&dyn ResponseHandler>,
) -> Result<String> {
    let mut capabilities: Vec<Capability> = Vec::with_capacity(options.capability_names.len());
    for name in &options.capability_names {
        capabilities.push(
            generator
                .lookup_capability(name)
                .ok_or_else(|| Error::CapabilityNotFound(name.clone()))?,
        );
    }

    debug!(capabilities = capabilities.len(), "starting a dialog");
    let request = GenerateRequest::prompt(
        Vec::new(),
        capabilities,
        options.system_prompt.clone(),
        options.user_prompt.clone(),
    );
    let mut response = generator.generate(cancel, request).await?;

    if let Some(handler) = handler {
        response = handler.handle(cancel, response).await?;
    }

    Ok(response.text())
}

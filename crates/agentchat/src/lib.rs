//! Tool-invoking agent shell: a chat client with a bounded tool loop, agent
//! descriptors, and a runner that ties the two together.

mod agent;
mod config;
mod runner;

pub use agent::{AgentDescriptor, AgentSummary};
pub use config::RunnerConfig;
pub use runner::{AgentRunner, ToolInvocation, ToolLoopOptions, ToolLoopResult};

use agentchat_core::{
    validate_request, AdapterInfo, AgentError, ChatAdapter, ChatRequest, ChatResponse,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Client {
    adapter: Arc<dyn ChatAdapter>,
}

impl Client {
    pub fn new(adapter: Arc<dyn ChatAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter_info(&self) -> AdapterInfo {
        self.adapter.info()
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        validate_request(&request)?;
        self.adapter.chat(request).await
    }

    async fn chat_within(
        &self,
        request: ChatRequest,
        limit: Option<Duration>,
    ) -> Result<ChatResponse, AgentError> {
        match limit {
            Some(limit) => tokio::time::timeout(limit, self.adapter.chat(request))
                .await
                .map_err(|_| AgentError::Timeout(limit))?,
            None => self.adapter.chat(request).await,
        }
    }
}

pub use agentchat_core;
pub use agentchat_tools;

#[cfg(feature = "gemini")]
pub use agentchat_adapter_gemini as gemini;

use crate::agent::AgentDescriptor;
use crate::config::RunnerConfig;
use crate::Client;
use agentchat_core::{
    validate_request, AgentError, ChatRequest, ChatResponse, Message, ToolCall,
};
use agentchat_tools::{ToolBox, ToolExecutor};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolLoopOptions {
    pub max_steps: usize,
    pub request_timeout: Option<Duration>,
}

impl Default for ToolLoopOptions {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for ToolLoopOptions {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            request_timeout: config.request_timeout,
        }
    }
}

/// A tool call the model made during a run and what the tool returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub call: ToolCall,
    pub output: Value,
}

#[derive(Debug, Clone)]
pub struct ToolLoopResult {
    pub final_response: ChatResponse,
    pub tool_invocations: Vec<ToolInvocation>,
    /// Model calls made, including the final one.
    pub steps: usize,
}

impl Client {
    /// Runs the conversation until the model answers without asking for a
    /// tool, executing requested tools in order between model calls.
    ///
    /// Tool failures are handed back to the model as `status: error` results;
    /// only model and transport failures end the run early.
    pub async fn chat_with_tools(
        &self,
        mut request: ChatRequest,
        tools: &dyn ToolExecutor,
        options: ToolLoopOptions,
    ) -> Result<ToolLoopResult, AgentError> {
        validate_request(&request)?;
        if options.max_steps == 0 {
            return Err(AgentError::Validation(
                "max_steps must be at least 1".to_string(),
            ));
        }

        let mut tool_invocations = Vec::new();
        for step in 1..=options.max_steps {
            let response = self
                .chat_within(request.clone(), options.request_timeout)
                .await?;
            tracing::debug!(
                step,
                tool_calls = response.tool_calls.len(),
                "model step finished"
            );
            if response.tool_calls.is_empty() {
                return Ok(ToolLoopResult {
                    final_response: response,
                    tool_invocations,
                    steps: step,
                });
            }

            request.messages.push(Message::assistant_with_tool_calls(
                response.output_text.clone(),
                response.tool_calls.clone(),
            ));
            for call in response.tool_calls {
                let output = execute_tool(tools, &call);
                request.messages.push(Message::tool_result(&call, &output));
                tool_invocations.push(ToolInvocation { call, output });
            }
        }

        tracing::warn!(max_steps = options.max_steps, "tool loop hit its step limit");
        Err(AgentError::StepLimit(options.max_steps))
    }
}

fn execute_tool(tools: &dyn ToolExecutor, call: &ToolCall) -> Value {
    match tools.call(&call.name, call.arguments.clone()) {
        Ok(output) => {
            tracing::debug!(tool = %call.name, call_id = %call.id, "tool call finished");
            output
        }
        Err(err) => {
            tracing::warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
            err.to_result().into_value()
        }
    }
}

/// Drives one agent: its instruction becomes the system message, its tools
/// are offered to the model and executed locally.
#[derive(Clone)]
pub struct AgentRunner {
    client: Client,
    descriptor: Arc<AgentDescriptor>,
    toolbox: ToolBox,
    options: ToolLoopOptions,
    model_override: Option<String>,
}

impl AgentRunner {
    pub fn new(client: Client, descriptor: Arc<AgentDescriptor>) -> Self {
        let toolbox = descriptor.toolbox();
        Self {
            client,
            descriptor,
            toolbox,
            options: ToolLoopOptions::default(),
            model_override: None,
        }
    }

    pub fn with_config(mut self, config: &RunnerConfig) -> Self {
        self.options = ToolLoopOptions::from(config);
        self.model_override = config.model_override.clone();
        self
    }

    pub fn with_options(mut self, options: ToolLoopOptions) -> Self {
        self.options = options;
        self
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    pub fn model(&self) -> &str {
        self.model_override
            .as_deref()
            .unwrap_or_else(|| self.descriptor.model())
    }

    pub fn build_request(&self, user_text: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !self.descriptor.instruction().is_empty() {
            messages.push(Message::system(self.descriptor.instruction()));
        }
        messages.push(Message::user(user_text));

        let mut request = ChatRequest::new(self.model(), messages);
        request.tools = self.toolbox.definitions();
        request.metadata = serde_json::json!({ "agent": self.descriptor.name() });
        request
    }

    pub async fn run(&self, user_text: &str) -> Result<ToolLoopResult, AgentError> {
        if user_text.trim().is_empty() {
            return Err(AgentError::Validation(
                "user text cannot be empty".to_string(),
            ));
        }

        let span = tracing::info_span!(
            "agent_run",
            agent = %self.descriptor.name(),
            model = %self.model()
        );
        async {
            tracing::info!("running agent");
            let result = self
                .client
                .chat_with_tools(self.build_request(user_text), &self.toolbox, self.options)
                .await?;
            tracing::info!(
                steps = result.steps,
                tool_calls = result.tool_invocations.len(),
                "agent replied"
            );
            Ok::<_, AgentError>(result)
        }
        .instrument(span)
        .await
    }
}

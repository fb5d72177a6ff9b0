//! A scripted `ChatAdapter` that answers from a fixed list of responses and
//! records every request it receives.

use agentchat_core::{
    AdapterInfo, AgentError, CapabilityMatrix, ChatAdapter, ChatRequest, ChatResponse, ToolCall,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub request: ChatRequest,
    pub response: Option<ChatResponse>,
}

#[derive(Debug, Clone)]
pub enum ReplayStep {
    Respond(ChatResponse),
    Fail(String),
}

#[derive(Debug, Default)]
pub struct ReplayAdapter {
    script: Mutex<VecDeque<ReplayStep>>,
    transcript: Mutex<Vec<ReplayEntry>>,
}

impl ReplayAdapter {
    pub fn new(responses: impl IntoIterator<Item = ChatResponse>) -> Self {
        Self::from_steps(responses.into_iter().map(ReplayStep::Respond))
    }

    pub fn from_steps(steps: impl IntoIterator<Item = ReplayStep>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn transcript(&self) -> Vec<ReplayEntry> {
        self.transcript
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.transcript()
            .into_iter()
            .map(|entry| entry.request)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|steps| steps.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatAdapter for ReplayAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "replay".to_string(),
            base_url: None,
            capabilities: CapabilityMatrix {
                tools: true,
                system_instruction: true,
                multimodal_input: false,
            },
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let step = self
            .script
            .lock()
            .map_err(|_| AgentError::Internal("replay script lock poisoned".to_string()))?
            .pop_front();
        let result = match step {
            Some(ReplayStep::Respond(response)) => Ok(response),
            Some(ReplayStep::Fail(message)) => Err(AgentError::Provider(message)),
            None => Err(AgentError::Internal("replay script exhausted".to_string())),
        };
        self.transcript
            .lock()
            .map_err(|_| AgentError::Internal("replay transcript lock poisoned".to_string()))?
            .push(ReplayEntry {
                request,
                response: result.as_ref().ok().cloned(),
            });
        result
    }
}

pub fn text_response(text: impl Into<String>) -> ChatResponse {
    ChatResponse {
        id: String::new(),
        model: "replay".to_string(),
        output_text: text.into(),
        tool_calls: Vec::new(),
        usage: None,
    }
}

pub fn tool_call_response(id: &str, name: &str, arguments: Value) -> ChatResponse {
    ChatResponse {
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
            signature: None,
        }],
        ..text_response("")
    }
}

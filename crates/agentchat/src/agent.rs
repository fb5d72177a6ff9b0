use agentchat_core::ToolDefinition;
use agentchat_tools::{FunctionTool, ToolBox};
use serde::Serialize;
use std::sync::Arc;

/// Static configuration of an agent: who it is, what it is told, which model
/// backs it, and which tools it may call.
///
/// Built once with the `with_*` setters and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    model: String,
    name: String,
    description: String,
    instruction: String,
    tools: Vec<Arc<FunctionTool>>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tool(mut self, tool: FunctionTool) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &[Arc<FunctionTool>] {
        &self.tools
    }

    pub fn toolbox(&self) -> ToolBox {
        self.tools.iter().cloned().collect()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.toolbox().definitions()
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            model: self.model.clone(),
            description: self.description.clone(),
            tools: self.tools.iter().map(|t| t.name().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub model: String,
    pub description: String,
    pub tools: Vec<String>,
}

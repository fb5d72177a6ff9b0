use agentchat::gemini::GeminiAdapter;
use agentchat::{AgentRunner, Client, RunnerConfig};
use agentchat_agents::root_agent;
use agentchat_observability::{init_tracing, LogFormat};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::Text)?;

    // Needs GEMINI_API_KEY (or GOOGLE_API_KEY) in the environment.
    let adapter = GeminiAdapter::from_env()?;
    let runner = AgentRunner::new(Client::new(Arc::new(adapter)), Arc::new(root_agent()))
        .with_config(&RunnerConfig::from_env()?);

    let city = std::env::args().nth(1).unwrap_or_else(|| "Paris".to_string());
    let result = runner
        .run(&format!("What time is it in {city}?"))
        .await?;

    for invocation in &result.tool_invocations {
        println!("{} -> {}", invocation.call.name, invocation.output);
    }
    println!("{}", result.final_response.output_text);
    Ok(())
}

use agentchat::agentchat_tools::ToolExecutor;
use agentchat::gemini::GeminiAdapter;
use agentchat::{AgentDescriptor, AgentRunner, Client, RunnerConfig};
use agentchat_observability::{init_tracing, LogFormat};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chat", about = "Talk to the built-in agents")]
struct Cli {
    /// Log output format (text, json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available agents
    List,
    /// Send one message to an agent
    Run {
        /// Agent name (defaults to sap_cpi_agent)
        #[arg(long)]
        agent: Option<String>,
        /// Message text
        prompt: Vec<String>,
    },
    /// Call one of an agent's tools directly, without the model
    Tool {
        #[arg(long)]
        agent: Option<String>,
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn pick_agent(name: Option<&str>) -> Result<AgentDescriptor, Box<dyn std::error::Error>> {
    match name {
        Some(name) => agentchat_agents::find(name)
            .ok_or_else(|| format!("unknown agent `{name}`, try `chat list`").into()),
        None => Ok(agentchat_agents::default_agent()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::List => {
            for agent in agentchat_agents::catalog() {
                println!("{}", serde_json::to_string(&agent.summary())?);
            }
        }
        Commands::Run { agent, prompt } => {
            let descriptor = pick_agent(agent.as_deref())?;
            let adapter = GeminiAdapter::from_env()?;
            let runner = AgentRunner::new(Client::new(Arc::new(adapter)), Arc::new(descriptor))
                .with_config(&RunnerConfig::from_env()?);
            let result = runner.run(&prompt.join(" ")).await?;
            println!("{}", result.final_response.output_text);
        }
        Commands::Tool { agent, name, args } => {
            let descriptor = pick_agent(agent.as_deref())?;
            let input: Value = serde_json::from_str(&args)?;
            let output = descriptor.toolbox().call(&name, input)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

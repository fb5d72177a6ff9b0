//! Mock SAP Cloud Platform Integration agents: a Groovy script generator and
//! a text formatter.

use agentchat::AgentDescriptor;
use agentchat_schema::ParameterSpec;
use agentchat_tools::{FunctionTool, ToolInvocationResult};

pub const SAP_CPI_MODEL: &str = "gemini-1.5-pro-preview-0409";

const PRETTY_HEADER: &str = "*** PRETTY PRINTED ***";
const PRETTY_FOOTER: &str = "**********************";

/// Returns a placeholder `processData` script with the requirement embedded
/// as a comment.
pub fn generate_sap_cpi_groovy_script(requirement: &str) -> ToolInvocationResult {
    // Blank lines inside the method keep their four-space indent.
    let script = format!(
        concat!(
            "\n",
            "import com.sap.gateway.ip.core.customdev.util.Message;\n",
            "import java.util.HashMap;\n",
            "\n",
            "def Message processData(Message message) {{\n",
            "    // Generated script for: {requirement}\n",
            "    \n",
            "    // Body\n",
            "    def body = message.getBody(java.lang.String.class);\n",
            "    \n",
            "    // Properties\n",
            "    map = message.getProperties();\n",
            "    \n",
            "    // Logic here...\n",
            "    \n",
            "    return message;\n",
            "}}\n",
        ),
        requirement = requirement,
    );
    ToolInvocationResult::success().with("script", script)
}

pub fn pretty_print_content(content: &str) -> ToolInvocationResult {
    ToolInvocationResult::success().with(
        "formatted_content",
        format!("{PRETTY_HEADER}\n\n{content}\n\n{PRETTY_FOOTER}"),
    )
}

pub fn groovy_script_tool() -> FunctionTool {
    FunctionTool::new(
        "generate_sap_cpi_groovy_script",
        "Generates a SAP CPI Groovy script based on the requirement.",
        vec![ParameterSpec::required(
            "requirement",
            "What the integration flow script should do",
        )],
        |args| generate_sap_cpi_groovy_script(args.required("requirement")),
    )
}

pub fn pretty_print_tool() -> FunctionTool {
    FunctionTool::new(
        "pretty_print_content",
        "Formats the content to be more readable/pretty.",
        vec![ParameterSpec::required("content", "Text or code to format")],
        |args| pretty_print_content(args.required("content")),
    )
}

pub fn sap_cpi_agent() -> AgentDescriptor {
    AgentDescriptor::new("sap_cpi_agent", SAP_CPI_MODEL)
        .with_description("Helps generate SAP CPI Groovy scripts.")
        .with_instruction(
            "You are an expert in SAP CPI and Groovy scripting. Help the user generate scripts.",
        )
        .with_tool(groovy_script_tool())
}

pub fn pretty_print_agent() -> AgentDescriptor {
    AgentDescriptor::new("pretty_print_agent", SAP_CPI_MODEL)
        .with_description("Formats text to be pretty and readable.")
        .with_instruction(
            "You are a formatter. Take the input and make it look pretty and structured.",
        )
        .with_tool(pretty_print_tool())
}

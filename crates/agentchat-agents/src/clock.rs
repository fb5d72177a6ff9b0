use agentchat::AgentDescriptor;
use agentchat_schema::ParameterSpec;
use agentchat_tools::{FunctionTool, ToolInvocationResult};

pub const CLOCK_MODEL: &str = "gemini-3-pro-preview";

// Canned; no time zone lookup.
const FIXED_TIME: &str = "10:30 AM";

pub fn get_current_time(city: &str) -> ToolInvocationResult {
    ToolInvocationResult::success()
        .with("city", city)
        .with("time", FIXED_TIME)
}

pub fn current_time_tool() -> FunctionTool {
    FunctionTool::new(
        "get_current_time",
        "Returns the current time in a specified city.",
        vec![ParameterSpec::required("city", "Name of the city")],
        |args| get_current_time(args.required("city")),
    )
}

pub fn root_agent() -> AgentDescriptor {
    AgentDescriptor::new("root_agent", CLOCK_MODEL)
        .with_description("Tells the current time in a specified city.")
        .with_instruction(
            "You are a helpful assistant that tells the current time in cities. \
             Use the 'get_current_time' tool for this purpose.",
        )
        .with_tool(current_time_tool())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_city_and_fixed_time() {
        let result = get_current_time("Paris");
        assert!(result.is_success());
        assert_eq!(result.get_str("city"), Some("Paris"));
        assert_eq!(result.get_str("time"), Some("10:30 AM"));
    }

    #[test]
    fn empty_city_still_succeeds() {
        let result = get_current_time("");
        assert!(result.is_success());
        assert_eq!(result.get_str("city"), Some(""));
        assert_eq!(result, get_current_time(""));
    }

    #[test]
    fn instruction_names_the_tool() {
        let agent = root_agent();
        assert!(agent.instruction().contains("'get_current_time'"));
        assert_eq!(agent.tool_definitions()[0].name, "get_current_time");
    }
}

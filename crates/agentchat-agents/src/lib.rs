//! Built-in agents: the SAP CPI script generator, the pretty printer, and the
//! time-telling `root_agent`.

mod clock;
mod sap_cpi;

pub use clock::{current_time_tool, get_current_time, root_agent, CLOCK_MODEL};
pub use sap_cpi::{
    generate_sap_cpi_groovy_script, groovy_script_tool, pretty_print_agent, pretty_print_content,
    pretty_print_tool, sap_cpi_agent, SAP_CPI_MODEL,
};

use agentchat::AgentDescriptor;

/// Every built-in agent, in a fixed order.
pub fn catalog() -> Vec<AgentDescriptor> {
    vec![sap_cpi_agent(), pretty_print_agent(), root_agent()]
}

pub fn find(name: &str) -> Option<AgentDescriptor> {
    catalog().into_iter().find(|agent| agent.name() == name)
}

/// The agent served when the caller does not pick one.
pub fn default_agent() -> AgentDescriptor {
    sap_cpi_agent()
}

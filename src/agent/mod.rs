pub mod tools;
mod executor;
mod parser;
mod prompt;

pub use executor::{AgentOutcome, AgentTrace, SqlAgent, DEFAULT_MAX_ITERATIONS, STOPPED_EARLY};
pub use parser::{parse_output, AgentStep, OutputParseError};
pub use prompt::{format_agent_input, render_agent_prompt, AGENT_TEMPLATE};
pub use tools::{retail_tools, Tool};

use std::sync::Arc;

use crate::database::Database;
use crate::error::Result;
use crate::llm::{ChatModel, Message};

use super::parser::{parse_output, truncate_at_observation, AgentStep, OBSERVATION_STOP};
use super::prompt::{format_agent_input, render_agent_prompt};
use super::tools::{retail_tools, Tool};

pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const STOPPED_EARLY: &str = "Agent stopped due to iteration limit or time limit.";

/// One tool call made while answering a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTrace {
    pub log: String,
    pub tool: Option<String>,
    pub input: Option<String>,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub output: String,
    pub steps: Vec<AgentTrace>,
    pub stopped_early: bool,
}

/// ReAct loop over the retail tools: the model picks a tool, the tool runs
/// locally, and its observation goes back into the next prompt until the
/// model produces a final answer.
pub struct SqlAgent<'a> {
    model: Arc<dyn ChatModel>,
    db: &'a Database,
    tools: Vec<Box<dyn Tool + 'a>>,
    max_iterations: usize,
}

impl<'a> SqlAgent<'a> {
    pub fn new(model: Arc<dyn ChatModel>, db: &'a Database) -> Self {
        Self {
            model,
            db,
            tools: retail_tools(db),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Answers one question. Only a failed model call is an `Err`; tool
    /// failures and malformed model output become observations.
    #[tracing::instrument(skip(self, question), fields(mode = %self.db.mode(), question_len = question.len()))]
    pub async fn run(&self, question: &str) -> Result<AgentOutcome> {
        let schema_text = match self.db.schema() {
            Ok(schema) => schema.render_summary(),
            Err(e) => format!("Error fetching schema: {}", e),
        };
        let input = format_agent_input(&schema_text, question);
        let stop = vec![OBSERVATION_STOP.to_string()];

        let mut scratchpad = String::new();
        let mut steps = Vec::new();

        for iteration in 1..=self.max_iterations {
            let prompt = render_agent_prompt(&self.tools, &input, &scratchpad);
            let completion = self.model.complete(&[Message::user(prompt)], &stop).await?;
            let text = truncate_at_observation(&completion);

            let (tool, tool_input, observation) = match parse_output(text) {
                Ok(AgentStep::Finish { output }) => {
                    tracing::info!(iteration, "final answer");
                    return Ok(AgentOutcome {
                        output,
                        steps,
                        stopped_early: false,
                    });
                }
                Ok(AgentStep::Action { tool, input }) => {
                    tracing::info!(iteration, tool = %tool, input = %input, "tool call");
                    let observation = self.invoke(&tool, &input);
                    (Some(tool), Some(input), observation)
                }
                Err(e) => {
                    tracing::warn!(iteration, error = %e, "unparseable model output");
                    (None, None, e.observation())
                }
            };

            tracing::debug!(iteration, observation = %observation, "observation");
            scratchpad.push_str(text);
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&observation);
            scratchpad.push_str("\nThought: ");

            steps.push(AgentTrace {
                log: text.to_string(),
                tool,
                input: tool_input,
                observation,
            });
        }

        tracing::warn!(max_iterations = self.max_iterations, "agent stopped early");
        Ok(AgentOutcome {
            output: STOPPED_EARLY.to_string(),
            steps,
            stopped_early: true,
        })
    }

    fn invoke(&self, tool: &str, input: &str) -> String {
        match self.tools.iter().find(|t| t.name() == tool) {
            Some(t) => t.run(input),
            None => format!(
                "{} is not a valid tool, try one of [{}].",
                tool,
                self.tool_names().join(", ")
            ),
        }
    }
}

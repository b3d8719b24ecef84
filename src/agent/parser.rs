use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const FINAL_ANSWER: &str = "Final Answer:";
pub const OBSERVATION_STOP: &str = "\nObservation";

static ACTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").unwrap()
});

static ACTION_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").unwrap());

static ACTION_INPUT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").unwrap());

/// What the model asked for on one turn of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action { tool: String, input: String },
    Finish { output: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputParseError {
    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    FinalAnswerAndAction,

    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Could not parse LLM output")]
    Unparseable,
}

impl OutputParseError {
    /// Text fed back to the model as the observation for a malformed turn.
    pub fn observation(&self) -> String {
        match self {
            OutputParseError::MissingAction | OutputParseError::MissingActionInput => self.to_string(),
            OutputParseError::FinalAnswerAndAction | OutputParseError::Unparseable => {
                "Invalid or incomplete response".to_string()
            }
        }
    }
}

/// Cuts the completion at the first observation marker, for endpoints that
/// ignore the stop sequence and hallucinate tool results.
pub fn truncate_at_observation(text: &str) -> &str {
    match text.find(OBSERVATION_STOP) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

pub fn parse_output(text: &str) -> Result<AgentStep, OutputParseError> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(captures) = ACTION_REGEX.captures(text) {
        if includes_answer {
            return Err(OutputParseError::FinalAnswerAndAction);
        }
        let tool = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let input = captures
            .get(2)
            .map(|m| m.as_str().trim_matches(' ').trim_matches('"'))
            .unwrap_or_default();
        return Ok(AgentStep::Action {
            tool: tool.to_string(),
            input: input.to_string(),
        });
    }

    if includes_answer {
        let output = text.rsplit(FINAL_ANSWER).next().unwrap_or_default().trim();
        return Ok(AgentStep::Finish {
            output: output.to_string(),
        });
    }

    if !ACTION_ONLY_REGEX.is_match(text) {
        Err(OutputParseError::MissingAction)
    } else if !ACTION_INPUT_REGEX.is_match(text) {
        Err(OutputParseError::MissingActionInput)
    } else {
        Err(OutputParseError::Unparseable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let text = "Thought: I should count customers.\nAction: query_db\nAction Input: SELECT COUNT(*) FROM customers";
        assert_eq!(
            parse_output(text).unwrap(),
            AgentStep::Action {
                tool: "query_db".to_string(),
                input: "SELECT COUNT(*) FROM customers".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_action_strips_quotes() {
        let text = "Action: get_column_values\nAction Input: \"customers,state\"";
        match parse_output(text).unwrap() {
            AgentStep::Action { input, .. } => assert_eq!(input, "customers,state"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_multiline_input() {
        let text = "Action: query_db\nAction Input: SELECT name\nFROM customers\nWHERE state = 'TX'";
        match parse_output(text).unwrap() {
            AgentStep::Action { input, .. } => {
                assert_eq!(input, "SELECT name\nFROM customers\nWHERE state = 'TX'")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_final_answer() {
        let text = "Thought: I now know the final answer\nFinal Answer: There are 42 customers.";
        assert_eq!(
            parse_output(text).unwrap(),
            AgentStep::Finish {
                output: "There are 42 customers.".to_string()
            }
        );
    }

    #[test]
    fn test_final_answer_with_action_is_error() {
        let text = "Action: query_db\nAction Input: SELECT 1\nFinal Answer: 1";
        assert_eq!(parse_output(text), Err(OutputParseError::FinalAnswerAndAction));
    }

    #[test]
    fn test_missing_action() {
        let err = parse_output("I think the answer is probably 5").unwrap_err();
        assert_eq!(err, OutputParseError::MissingAction);
        assert_eq!(err.observation(), "Invalid Format: Missing 'Action:' after 'Thought:'");
    }

    #[test]
    fn test_missing_action_input() {
        let err = parse_output("Thought: look it up\nAction: get_schema").unwrap_err();
        assert_eq!(err, OutputParseError::MissingActionInput);
    }

    #[test]
    fn test_truncate_at_observation() {
        let text = "Action: get_schema\nAction Input: \nObservation: made up";
        assert_eq!(truncate_at_observation(text), "Action: get_schema\nAction Input: ");
        assert_eq!(truncate_at_observation("Final Answer: x"), "Final Answer: x");
    }
}

use super::tools::Tool;

pub const AGENT_TEMPLATE: &str = "
You are a helpful and intelligent assistant that helps users interact with a company retail store database.

You have access to the following tools:
{tools}

Here are the tool names:
{tool_names}

Use the following format:

Question: the input question you must answer
Thought: think about what to do, you can use the tools to get the information you need, then use the information to answer the question.
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (repeat Thought/Action/Action Input/Observation as needed)
Thought: I now know the final answer
Final Answer: the final answer to the original question in well formatted descriptive answer or tables as needed.

Begin!

Question: {input}
{agent_scratchpad}
";

pub fn format_agent_input(schema_text: &str, question: &str) -> String {
    format!(
        "The current database schema is:\n{}\n\nNow answer this:\n{}",
        schema_text, question
    )
}

pub fn render_agent_prompt(tools: &[Box<dyn Tool + '_>], input: &str, scratchpad: &str) -> String {
    let descriptions: Vec<String> = tools
        .iter()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect();
    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    let tools_text = descriptions.join("\n");
    let names_text = names.join(", ");

    fill_template(
        AGENT_TEMPLATE,
        &[
            ("tools", tools_text.as_str()),
            ("tool_names", names_text.as_str()),
            ("input", input),
            ("agent_scratchpad", scratchpad),
        ],
    )
}

/// Single-pass `{name}` substitution. Substituted text is never rescanned,
/// so braces in questions or SQL survive unchanged.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let matched = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });

        match matched {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

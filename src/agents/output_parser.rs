// Parsing of the model's ReAct-formatted text output
use anyhow::Error;

use super::agent::{AgentAction, AgentFinish, AgentOutput};

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
const ACTION_MARKER: &str = "Action:";
const ACTION_INPUT_MARKER: &str = "Action Input:";

/// The completion followed neither the action format nor the final-answer
/// format. Carries the offending text so the executor can feed it back to
/// the model as an observation.
#[derive(Debug)]
pub struct OutputParseError {
    pub text: String,
}

impl std::fmt::Display for OutputParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not parse agent output: {}", self.text)
    }
}

impl std::error::Error for OutputParseError {}

/// Parse a ReAct completion into the next agent step.
///
/// A `Final Answer:` marker wins; otherwise the last `Action:` line and its
/// `Action Input:` line become an action. Anything else is a parse error.
pub fn parse_react_output(text: &str) -> Result<AgentOutput, Error> {
    if let Some(position) = text.find(FINAL_ANSWER_MARKER) {
        let answer = text[position + FINAL_ANSWER_MARKER.len()..].trim();
        return Ok(AgentOutput::Finish(AgentFinish::with_output(answer)));
    }

    if let Some(action) = parse_action(text) {
        return Ok(AgentOutput::Action(action));
    }

    Err(Error::new(OutputParseError {
        text: text.to_string(),
    }))
}

// Scan line by line, keeping the last Action/Action Input pair so the model
// restating an earlier step cannot confuse the parse
pub(crate) fn parse_action(text: &str) -> Option<AgentAction> {
    let mut tool: Option<String> = None;
    let mut tool_input: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(ACTION_INPUT_MARKER) {
            if tool.is_some() {
                tool_input = Some(strip_quotes(rest.trim()).to_string());
            }
        } else if let Some(rest) = trimmed.strip_prefix(ACTION_MARKER) {
            tool = Some(rest.trim().to_string());
            tool_input = None;
        }
    }

    tool.map(|tool| AgentAction {
        tool,
        tool_input: tool_input.unwrap_or_default(),
        log: text.to_string(),
    })
}

fn strip_quotes(value: &str) -> &str {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value)
}

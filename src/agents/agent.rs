// Agent interface and related structure definitions
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::Error;

// One tool invocation decided by the agent
#[derive(Clone, Debug)]
pub struct AgentAction {
    /// Requested tool name
    pub tool: String,
    /// Input handed to the tool
    pub tool_input: String,
    /// The raw completion the action was parsed from, replayed into the
    /// scratchpad on the next iteration
    pub log: String,
}

// Result when the agent completes
#[derive(Clone, Debug)]
pub struct AgentFinish {
    pub return_values: HashMap<String, String>,
}

impl AgentFinish {
    /// Finish carrying a single final answer under the "output" key
    pub fn with_output(output: impl Into<String>) -> Self {
        let mut return_values = HashMap::new();
        return_values.insert("output".to_string(), output.into());
        Self { return_values }
    }

    pub fn output(&self) -> &str {
        self.return_values
            .get("output")
            .map(String::as_str)
            .unwrap_or("")
    }
}

// Unified agent output type
#[derive(Clone, Debug)]
pub enum AgentOutput {
    Action(AgentAction),
    Finish(AgentFinish),
}

// An agent decides the next step from the steps taken so far. Executing the
// chosen tool is the executor's job, not the agent's.
pub trait Agent: Send + Sync {
    /// Decide the next step given the prior (action, observation) pairs
    fn plan<'a>(
        &'a self,
        intermediate_steps: &'a [(AgentAction, String)],
        inputs: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, Error>> + Send + 'a>>;

    // Markers used when replaying steps into the scratchpad
    fn observation_prefix(&self) -> &str {
        "Observation: "
    }

    fn llm_prefix(&self) -> &str {
        "Thought: "
    }

    // Clone agent instance
    fn clone_agent(&self) -> Box<dyn Agent>;
}

impl Clone for Box<dyn Agent> {
    fn clone(&self) -> Self {
        self.as_ref().clone_agent()
    }
}

/// Replay prior steps into the text the model continues from
pub(crate) fn construct_scratchpad(
    intermediate_steps: &[(AgentAction, String)],
    observation_prefix: &str,
    llm_prefix: &str,
) -> String {
    let mut scratchpad = String::new();
    for (action, observation) in intermediate_steps {
        scratchpad.push_str(&action.log);
        scratchpad.push('\n');
        scratchpad.push_str(observation_prefix);
        scratchpad.push_str(observation);
        scratchpad.push('\n');
        scratchpad.push_str(llm_prefix);
    }
    scratchpad
}

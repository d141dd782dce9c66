// Agent executor: the plan / act / observe loop
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;
use log::{debug, warn};
use serde_json::Value;

use super::agent::{Agent, AgentAction, AgentOutput};
use super::output_parser::OutputParseError;
use crate::callbacks::CallbackHandler;
use crate::core::Runnable;
use crate::memory::BaseMemory;
use crate::tools::{find_matching_tool, Tool};

const DEFAULT_MAX_ITERATIONS: usize = 15;

const INVALID_FORMAT_OBSERVATION: &str =
    "Invalid output format. Either provide an Action with an Action Input, or a Final Answer.";

// Drives an agent until it produces a final answer: every action the agent
// plans is resolved against the tool set, executed, and fed back as an
// observation for the next planning round.
pub struct AgentExecutor {
    agent: Box<dyn Agent>,
    tools: Vec<Arc<dyn Tool>>,
    memory: Option<Box<dyn BaseMemory>>,
    callbacks: Vec<Arc<dyn CallbackHandler>>,
    max_iterations: usize,
    handle_parsing_errors: bool,
}

impl Clone for AgentExecutor {
    fn clone(&self) -> Self {
        Self {
            agent: self.agent.clone(),
            tools: self.tools.clone(),
            memory: self.memory.clone(),
            callbacks: self.callbacks.clone(),
            max_iterations: self.max_iterations,
            handle_parsing_errors: self.handle_parsing_errors,
        }
    }
}

impl AgentExecutor {
    pub fn new(agent: Box<dyn Agent>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            agent,
            tools,
            memory: None,
            callbacks: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            handle_parsing_errors: true,
        }
    }

    /// Attach a memory carrying conversation history across runs
    pub fn with_memory(mut self, memory: Box<dyn BaseMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Register a callback handler
    pub fn with_callback(mut self, callback: Arc<dyn CallbackHandler>) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Cap the number of planning rounds
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Turn malformed completions into errors instead of retry observations
    pub fn with_strict_parsing(mut self) -> Self {
        self.handle_parsing_errors = false;
        self
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn memory(&self) -> Option<&dyn BaseMemory> {
        self.memory.as_deref()
    }

    /// Run the loop for one user input and return the final answer.
    pub async fn run(&self, input: &str) -> Result<String, Error> {
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), input.to_string());

        // Memory variables (e.g. chat_history) join the prompt inputs
        if let Some(memory) = &self.memory {
            let variables = memory.load_memory_variables(&HashMap::new()).await?;
            for (key, value) in variables {
                let rendered = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                inputs.entry(key).or_insert(rendered);
            }
        }

        let mut intermediate_steps: Vec<(AgentAction, String)> = Vec::new();

        for iteration in 0..self.max_iterations {
            debug!("Agent iteration {}", iteration + 1);

            let output = match self.agent.plan(&intermediate_steps, &inputs).await {
                Ok(output) => output,
                Err(e) => {
                    if self.handle_parsing_errors {
                        if let Some(parse_error) = e.downcast_ref::<OutputParseError>() {
                            // Replay the malformed completion with a corrective
                            // observation so the model can try again
                            warn!("Agent produced unparseable output, asking it to retry");
                            let action = AgentAction {
                                tool: "invalid_format".to_string(),
                                tool_input: String::new(),
                                log: parse_error.text.clone(),
                            };
                            intermediate_steps
                                .push((action, INVALID_FORMAT_OBSERVATION.to_string()));
                            continue;
                        }
                    }
                    return Err(e);
                }
            };

            match output {
                AgentOutput::Finish(finish) => {
                    for callback in &self.callbacks {
                        callback.on_agent_finish(&finish);
                    }

                    let output = finish.output().to_string();
                    self.save_turn(input, &output).await?;
                    return Ok(output);
                }
                AgentOutput::Action(action) => {
                    for callback in &self.callbacks {
                        callback.on_agent_action(&action);
                    }

                    let observation = self.execute_action(&action).await;
                    intermediate_steps.push((action, observation));
                }
            }
        }

        Err(Error::msg(format!(
            "Agent exceeded maximum iterations ({})",
            self.max_iterations
        )))
    }

    // Resolve and invoke the requested tool. Failures become observations
    // rather than errors so the model gets a chance to recover.
    async fn execute_action(&self, action: &AgentAction) -> String {
        let Some(tool) = find_matching_tool(&self.tools, &action.tool) else {
            let valid_names = self
                .tools
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ");
            return format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool, valid_names
            );
        };

        for callback in &self.callbacks {
            callback.on_tool_start(tool.name(), &action.tool_input);
        }

        match tool.invoke(&action.tool_input).await {
            Ok(observation) => {
                for callback in &self.callbacks {
                    callback.on_tool_end(tool.name(), &observation);
                }
                observation
            }
            Err(e) => {
                for callback in &self.callbacks {
                    callback.on_tool_error(tool.name(), &e.to_string());
                }
                format!("Tool error: {}", e)
            }
        }
    }

    async fn save_turn(&self, input: &str, output: &str) -> Result<(), Error> {
        if let Some(memory) = &self.memory {
            let mut mem_inputs = HashMap::new();
            mem_inputs.insert("input".to_string(), Value::String(input.to_string()));
            let mut mem_outputs = HashMap::new();
            mem_outputs.insert("output".to_string(), Value::String(output.to_string()));
            memory.save_context(&mem_inputs, &mem_outputs).await?;
        }
        Ok(())
    }
}

impl Runnable<HashMap<String, String>, String> for AgentExecutor {
    fn invoke(
        &self,
        input: HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<String, Error>> + Send>> {
        let executor = self.clone();
        Box::pin(async move {
            let input = input
                .get("input")
                .cloned()
                .ok_or_else(|| Error::msg("Missing 'input' key"))?;
            executor.run(&input).await
        })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<HashMap<String, String>, String> + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{initialize_agent, AgentType};
    use crate::models::{ChatCompletion, ChatMessage, ChatMessageContent, ChatModel};
    use crate::tools::SimpleTool;
    use std::future::Future;
    use std::sync::Mutex;

    // Plays back a script of completions, one per LLM call
    struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChatModel for ScriptedModel {
        fn invoke(
            &self,
            messages: Vec<ChatMessage>,
            _stop: Option<Vec<String>>,
        ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, Error>> + Send + '_>> {
            if let Some(message) = messages.first() {
                self.prompts.lock().unwrap().push(message.content().to_string());
            }
            let response = self.responses.lock().unwrap().pop();
            Box::pin(async move {
                let content =
                    response.ok_or_else(|| Error::msg("Script exhausted"))?;
                Ok(ChatCompletion {
                    message: ChatMessage::Ai(ChatMessageContent::new(content)),
                    usage: None,
                    model_name: "scripted".to_string(),
                })
            })
        }
    }

    fn echo_tool() -> Arc<dyn Tool> {
        Arc::new(SimpleTool::new(
            "echo",
            "Echo the input back.",
            |input| async move { Ok(format!("echoed {}", input)) },
        ))
    }

    #[tokio::test]
    async fn test_full_episode() {
        let model = ScriptedModel::new(&[
            "I should try the tool.\nAction: echo\nAction Input: hello",
            "I now know the final answer.\nFinal Answer: it said echoed hello",
        ]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model.clone(),
            AgentType::ZeroShotReactDescription,
        );

        let output = executor.run("say hello").await.unwrap();
        assert_eq!(output, "it said echoed hello");

        // The second prompt replays the first action and its observation
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Action: echo"));
        assert!(prompts[1].contains("Observation: echoed hello"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let model = ScriptedModel::new(&[
            "Action: missing\nAction Input: x",
            "Final Answer: gave up",
        ]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model.clone(),
            AgentType::ZeroShotReactDescription,
        );

        let output = executor.run("q").await.unwrap();
        assert_eq!(output, "gave up");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].contains("missing is not a valid tool, try one of [echo]."));
    }

    #[tokio::test]
    async fn test_parse_error_retries_with_observation() {
        let model = ScriptedModel::new(&[
            "just rambling with no structure",
            "Final Answer: recovered",
        ]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model.clone(),
            AgentType::ZeroShotReactDescription,
        );

        let output = executor.run("q").await.unwrap();
        assert_eq!(output, "recovered");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].contains(INVALID_FORMAT_OBSERVATION));
    }

    #[tokio::test]
    async fn test_strict_parsing_propagates_error() {
        let model = ScriptedModel::new(&["just rambling with no structure"]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model,
            AgentType::ZeroShotReactDescription,
        )
        .with_strict_parsing();

        let err = executor.run("q").await.unwrap_err();
        assert!(err.downcast_ref::<OutputParseError>().is_some());
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        // The model keeps asking for the tool and never finishes
        let model = ScriptedModel::new(&[
            "Action: echo\nAction Input: a",
            "Action: echo\nAction Input: b",
            "Action: echo\nAction Input: c",
        ]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model,
            AgentType::ZeroShotReactDescription,
        )
        .with_max_iterations(3);

        let err = executor.run("loop forever").await.unwrap_err();
        assert!(err.to_string().contains("maximum iterations (3)"));
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let failing: Arc<dyn Tool> = Arc::new(SimpleTool::new(
            "broken",
            "Always fails.",
            |_| async { Err(Error::msg("boom")) },
        ));
        let model = ScriptedModel::new(&[
            "Action: broken\nAction Input: x",
            "Final Answer: the tool is broken",
        ]);
        let executor = initialize_agent(
            vec![failing],
            model.clone(),
            AgentType::ZeroShotReactDescription,
        );

        let output = executor.run("q").await.unwrap();
        assert_eq!(output, "the tool is broken");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].contains("Tool error: boom"));
    }

    #[tokio::test]
    async fn test_conversational_memory_carries_across_runs() {
        let model = ScriptedModel::new(&[
            "Thought: Do I need to use a tool? No\nAI: Hi Ada!",
            "Thought: Do I need to use a tool? No\nAI: Your name is Ada.",
        ]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model.clone(),
            AgentType::ConversationalReactDescription,
        );

        let first = executor.run("my name is Ada").await.unwrap();
        assert_eq!(first, "Hi Ada!");

        let second = executor.run("what is my name?").await.unwrap();
        assert_eq!(second, "Your name is Ada.");

        // The second prompt contains the first exchange
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].contains("Human: my name is Ada"));
        assert!(prompts[1].contains("AI: Hi Ada!"));
    }

    #[tokio::test]
    async fn test_invoke_via_runnable() {
        let model = ScriptedModel::new(&["Final Answer: direct"]);
        let executor = initialize_agent(
            vec![echo_tool()],
            model,
            AgentType::ZeroShotReactDescription,
        );

        let mut input = HashMap::new();
        input.insert("input".to_string(), "q".to_string());
        let output = executor.invoke(input).await.unwrap();
        assert_eq!(output, "direct");
    }
}

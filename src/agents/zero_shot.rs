// Zero-shot ReAct agent: tools selected purely from their descriptions
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;

use super::agent::{construct_scratchpad, Agent, AgentAction, AgentOutput};
use super::output_parser::parse_react_output;
use crate::chains::LLMChain;
use crate::models::ChatModel;
use crate::prompt::PromptTemplate;
use crate::tools::Tool;

pub const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

pub const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

pub const SUFFIX: &str = "Begin!

Question: {input}
Thought:{agent_scratchpad}";

// The agent is an LLMChain over the assembled ReAct prompt plus the output
// parser. The chain stops completions at "\nObservation:" so the model
// cannot invent tool results.
pub struct ZeroShotAgent {
    chain: LLMChain,
}

impl ZeroShotAgent {
    pub fn new(model: Arc<dyn ChatModel>, tools: &[Arc<dyn Tool>]) -> Self {
        let prompt = Self::create_prompt(tools, PREFIX, FORMAT_INSTRUCTIONS, SUFFIX);
        Self::from_prompt(model, prompt)
    }

    pub fn from_prompt(model: Arc<dyn ChatModel>, prompt: PromptTemplate) -> Self {
        let chain =
            LLMChain::new(model, prompt).with_stop(vec!["\nObservation:".to_string()]);
        Self { chain }
    }

    /// Assemble the ReAct prompt for a tool set. The tool list renders as
    /// `name: description` lines and the valid names are inlined into the
    /// format instructions.
    pub fn create_prompt(
        tools: &[Arc<dyn Tool>],
        prefix: &str,
        format_instructions: &str,
        suffix: &str,
    ) -> PromptTemplate {
        let tool_strings = tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let tool_names = tools
            .iter()
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let format_instructions = format_instructions.replace("{tool_names}", &tool_names);
        let template = [prefix, &tool_strings, &format_instructions, suffix].join("\n\n");

        PromptTemplate::new(
            template,
            vec!["input".to_string(), "agent_scratchpad".to_string()],
        )
    }

    pub fn chain(&self) -> &LLMChain {
        &self.chain
    }
}

impl Agent for ZeroShotAgent {
    fn plan<'a>(
        &'a self,
        intermediate_steps: &'a [(AgentAction, String)],
        inputs: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, Error>> + Send + 'a>> {
        Box::pin(async move {
            let scratchpad = construct_scratchpad(
                intermediate_steps,
                self.observation_prefix(),
                self.llm_prefix(),
            );

            let mut full_inputs = inputs.clone();
            full_inputs.insert("agent_scratchpad".to_string(), scratchpad);

            let completion = self.chain.predict(&full_inputs).await?;
            parse_react_output(&completion)
        })
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(Self {
            chain: self.chain.clone(),
        })
    }
}

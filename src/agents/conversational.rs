// Conversational ReAct agent: carries chat history between turns
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;

use super::agent::{construct_scratchpad, Agent, AgentAction, AgentFinish, AgentOutput};
use super::output_parser::{parse_action, OutputParseError, FINAL_ANSWER_MARKER};
use super::zero_shot::ZeroShotAgent;
use crate::chains::LLMChain;
use crate::models::ChatModel;
use crate::prompt::PromptTemplate;
use crate::tools::Tool;

pub const CONVERSATIONAL_PREFIX: &str = "Assistant is a large language model able to help with \
a wide range of tasks, from answering simple questions to holding natural conversations on many \
topics.

TOOLS:
------

Assistant has access to the following tools:";

pub const CONVERSATIONAL_FORMAT_INSTRUCTIONS: &str = "To use a tool, please use the following format:

Thought: Do I need to use a tool? Yes
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action

When you have a response to say to the Human, or if you do not need to use a tool, you MUST use \
the format:

Thought: Do I need to use a tool? No
{ai_prefix}: [your response here]";

pub const CONVERSATIONAL_SUFFIX: &str = "Begin!

Previous conversation history:
{chat_history}

New input: {input}
Thought:{agent_scratchpad}";

const DEFAULT_AI_PREFIX: &str = "AI";

// Same ReAct loop as the zero-shot agent, but the prompt replays the
// conversation so far and the final answer arrives after the AI prefix
// instead of a Final Answer marker.
pub struct ConversationalAgent {
    chain: LLMChain,
    ai_prefix: String,
}

impl ConversationalAgent {
    pub fn new(model: Arc<dyn ChatModel>, tools: &[Arc<dyn Tool>]) -> Self {
        Self::with_ai_prefix(model, tools, DEFAULT_AI_PREFIX)
    }

    pub fn with_ai_prefix(
        model: Arc<dyn ChatModel>,
        tools: &[Arc<dyn Tool>],
        ai_prefix: impl Into<String>,
    ) -> Self {
        let ai_prefix = ai_prefix.into();
        let format_instructions =
            CONVERSATIONAL_FORMAT_INSTRUCTIONS.replace("{ai_prefix}", &ai_prefix);
        let prompt = Self::create_prompt(tools, &format_instructions);
        let chain =
            LLMChain::new(model, prompt).with_stop(vec!["\nObservation:".to_string()]);
        Self { chain, ai_prefix }
    }

    fn create_prompt(tools: &[Arc<dyn Tool>], format_instructions: &str) -> PromptTemplate {
        let prompt = ZeroShotAgent::create_prompt(
            tools,
            CONVERSATIONAL_PREFIX,
            format_instructions,
            CONVERSATIONAL_SUFFIX,
        );
        PromptTemplate::new(
            prompt.template().to_string(),
            vec![
                "input".to_string(),
                "chat_history".to_string(),
                "agent_scratchpad".to_string(),
            ],
        )
    }

    pub fn ai_prefix(&self) -> &str {
        &self.ai_prefix
    }

    // The conversational format ends a turn with "{ai_prefix}: ..." rather
    // than "Final Answer: ...", so this parser accepts both.
    fn parse_output(&self, text: &str) -> Result<AgentOutput, Error> {
        if let Some(action) = parse_action(text) {
            return Ok(AgentOutput::Action(action));
        }

        let ai_marker = format!("{}:", self.ai_prefix);
        if let Some(position) = text.find(&ai_marker) {
            let answer = text[position + ai_marker.len()..].trim();
            return Ok(AgentOutput::Finish(AgentFinish::with_output(answer)));
        }

        if let Some(position) = text.find(FINAL_ANSWER_MARKER) {
            let answer = text[position + FINAL_ANSWER_MARKER.len()..].trim();
            return Ok(AgentOutput::Finish(AgentFinish::with_output(answer)));
        }

        Err(Error::new(OutputParseError {
            text: text.to_string(),
        }))
    }
}

impl Agent for ConversationalAgent {
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
            full_inputs
                .entry("chat_history".to_string())
                .or_insert_with(String::new);

            let completion = self.chain.predict(&full_inputs).await?;
            self.parse_output(&completion)
        })
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(Self {
            chain: self.chain.clone(),
            ai_prefix: self.ai_prefix.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatCompletion, ChatMessage, ChatMessageContent};
    use crate::tools::SimpleTool;

    struct FixedModel(String);

    impl ChatModel for FixedModel {
        fn invoke(
            &self,
            _messages: Vec<ChatMessage>,
            _stop: Option<Vec<String>>,
        ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, Error>> + Send + '_>> {
            let content = self.0.clone();
            Box::pin(async move {
                Ok(ChatCompletion {
                    message: ChatMessage::Ai(ChatMessageContent::new(content)),
                    usage: None,
                    model_name: "fixed".to_string(),
                })
            })
        }
    }

    fn tools() -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(SimpleTool::new("search", "Look things up.", |_| async {
            Ok(String::new())
        }))]
    }

    fn agent(reply: &str) -> ConversationalAgent {
        ConversationalAgent::new(Arc::new(FixedModel(reply.to_string())), &tools())
    }

    #[test]
    fn test_prompt_carries_chat_history() {
        let agent = agent("unused");
        let template = agent.chain.prompt().template();
        assert!(template.contains("Previous conversation history:"));
        assert!(agent
            .chain
            .prompt()
            .input_variables()
            .contains(&"chat_history".to_string()));
    }

    #[tokio::test]
    async fn test_ai_prefix_ends_the_turn() {
        let agent = agent("Thought: Do I need to use a tool? No\nAI: Nice to meet you!");
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), "hi, I'm Ada".to_string());

        match agent.plan(&[], &inputs).await.unwrap() {
            AgentOutput::Finish(finish) => assert_eq!(finish.output(), "Nice to meet you!"),
            other => panic!("Expected finish, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_request_is_an_action() {
        let agent = agent(
            "Thought: Do I need to use a tool? Yes\nAction: search\nAction Input: weather",
        );
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), "what's the weather?".to_string());

        match agent.plan(&[], &inputs).await.unwrap() {
            AgentOutput::Action(action) => {
                assert_eq!(action.tool, "search");
                assert_eq!(action.tool_input, "weather");
            }
            other => panic!("Expected action, got {:?}", other),
        }
    }
}

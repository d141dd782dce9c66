// Agent module definition
mod agent;
mod conversational;
mod executor;
mod output_parser;
mod zero_shot;

use std::sync::Arc;

// Re-export module content
pub use agent::{Agent, AgentAction, AgentFinish, AgentOutput};
pub use conversational::ConversationalAgent;
pub use executor::AgentExecutor;
pub use output_parser::{parse_react_output, OutputParseError};
pub use zero_shot::ZeroShotAgent;

use crate::memory::ConversationBufferMemory;
use crate::models::ChatModel;
use crate::tools::Tool;

// Agent flavors constructible in one call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentType {
    /// Single-question ReAct agent, tools selected by description
    ZeroShotReactDescription,
    /// Chat ReAct agent carrying conversation history between turns
    ConversationalReactDescription,
}

/// Build a ready-to-run executor for the given tools, model, and agent type.
/// The conversational flavor gets a fresh buffer memory wired in.
pub fn initialize_agent(
    tools: Vec<Arc<dyn Tool>>,
    model: Arc<dyn ChatModel>,
    agent_type: AgentType,
) -> AgentExecutor {
    match agent_type {
        AgentType::ZeroShotReactDescription => {
            let agent = ZeroShotAgent::new(model, &tools);
            AgentExecutor::new(Box::new(agent), tools)
        }
        AgentType::ConversationalReactDescription => {
            let agent = ConversationalAgent::new(model, &tools);
            AgentExecutor::new(Box::new(agent), tools)
                .with_memory(Box::new(ConversationBufferMemory::new()))
        }
    }
}

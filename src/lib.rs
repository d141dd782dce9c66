// Reagent: a ReAct-style tool-using agent framework.

mod core;
mod models;
pub mod prompt;
pub mod chains;
pub mod tools;
pub mod memory;
pub mod agents;
pub mod callbacks;
pub mod serve;
pub mod settings;

// Re-export main components for external use
pub use crate::core::{pipe, Runnable, RunnableExt, RunnableSequence};
pub use models::{
    ChatCompletion, ChatMessage, ChatMessageContent, ChatModel, OpenAIChatModel, TokenUsage,
};
pub use prompt::PromptTemplate;
pub use chains::LLMChain;
pub use tools::{find_matching_tool, Calculator, SerpApiSearch, SimpleTool, Tool, Toolkit};
pub use memory::{
    BaseMemory, ConversationBufferMemory, ConversationSummaryMemory, FileChatMessageHistory,
    MessageHistoryMemory, StoredMessage,
};
pub use agents::{
    initialize_agent, Agent, AgentAction, AgentExecutor, AgentFinish, AgentOutput, AgentType,
    ConversationalAgent, ZeroShotAgent,
};
pub use callbacks::{CallbackHandler, LogCallbackHandler};
pub use serve::AgentServer;
pub use settings::Settings;

// Export anyhow so downstream users share one error type with the crate
pub use anyhow;

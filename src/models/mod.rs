// Model module definition
mod chat;
mod message;
mod openai;

// Re-export module content
pub use chat::{ChatCompletion, ChatModel};
pub use message::{ChatMessage, ChatMessageContent, TokenUsage};
pub use openai::OpenAIChatModel;

// Memory system module
pub mod base;
pub mod buffer;
pub mod message_history;
pub mod summary;
pub mod utils;

// Export main types and traits
pub use base::{BaseMemory, MemoryVariables};
pub use buffer::ConversationBufferMemory;
pub use message_history::{FileChatMessageHistory, MessageHistoryMemory, StoredMessage};
pub use summary::ConversationSummaryMemory;

// Message type definitions
use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

// Message content structure
#[derive(Clone, Debug)]
pub struct ChatMessageContent {
    pub content: String,
    pub name: Option<String>,
    // Provider-specific extras (e.g. the tool_call_id an API expects back)
    pub additional_kwargs: HashMap<String, Value>,
}

impl ChatMessageContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
            additional_kwargs: HashMap::new(),
        }
    }
}

// Message role enumeration, one variant per conversation role
#[derive(Clone, Debug)]
pub enum ChatMessage {
    System(ChatMessageContent),
    Human(ChatMessageContent),
    Ai(ChatMessageContent),
    Tool(ChatMessageContent),
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(ChatMessageContent::new(content))
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human(ChatMessageContent::new(content))
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai(ChatMessageContent::new(content))
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::Tool(ChatMessageContent::new(content))
    }

    // Wire-format role name
    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::Human(_) => "user",
            Self::Ai(_) => "assistant",
            Self::Tool(_) => "tool",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System(c) | Self::Human(c) | Self::Ai(c) | Self::Tool(c) => &c.content,
        }
    }
}

// Token usage statistics
#[derive(Clone, Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

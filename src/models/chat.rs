// Chat model interface and related structure definitions
use anyhow::Error;

use crate::models::message::{ChatMessage, TokenUsage};

// Simplified chat completion structure
pub struct ChatCompletion {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
    pub model_name: String,
}

// Chat model interface. `stop` carries optional stop sequences the caller
// wants the completion cut at (the ReAct agents stop at "\nObservation:").
pub trait ChatModel: Send + Sync {
    // Basic model information
    fn model_name(&self) -> Option<&str> {
        None
    }

    // Model base URL
    fn base_url(&self) -> String {
        "https://api.openai.com/v1".to_string()
    }

    // Core method: handle chat messages
    fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        stop: Option<Vec<String>>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ChatCompletion, Error>> + Send + '_>,
    >;
}

// Conversation buffer memory, the in-process turn history
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;
use serde_json::Value;
use tokio::sync::RwLock;

use super::base::{BaseMemory, MemoryVariables};

#[derive(Clone, Debug)]
pub(crate) struct BufferedMessage {
    pub role: BufferedRole,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BufferedRole {
    Human,
    Ai,
}

// Keeps the raw turns of the current conversation and renders them into a
// "Human: ... / AI: ..." transcript under the configured memory key. With a
// window set, only the last N exchanges survive.
pub struct ConversationBufferMemory {
    messages: Arc<RwLock<Vec<BufferedMessage>>>,
    memory_key: String,
    human_prefix: String,
    ai_prefix: String,
    max_turns: Option<usize>,
}

impl Clone for ConversationBufferMemory {
    fn clone(&self) -> Self {
        Self {
            messages: Arc::clone(&self.messages),
            memory_key: self.memory_key.clone(),
            human_prefix: self.human_prefix.clone(),
            ai_prefix: self.ai_prefix.clone(),
            max_turns: self.max_turns,
        }
    }
}

impl Default for ConversationBufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationBufferMemory {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            memory_key: "chat_history".to_string(),
            human_prefix: "Human".to_string(),
            ai_prefix: "AI".to_string(),
            max_turns: None,
        }
    }

    /// Store the transcript under a different prompt variable
    pub fn with_memory_key(mut self, memory_key: impl Into<String>) -> Self {
        self.memory_key = memory_key.into();
        self
    }

    /// Change the transcript line prefixes
    pub fn with_prefixes(
        mut self,
        human_prefix: impl Into<String>,
        ai_prefix: impl Into<String>,
    ) -> Self {
        self.human_prefix = human_prefix.into();
        self.ai_prefix = ai_prefix.into();
        self
    }

    /// Keep only the most recent `max_turns` exchanges
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn memory_key(&self) -> &str {
        &self.memory_key
    }

    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.push(BufferedRole::Human, content.into()).await;
    }

    pub async fn add_ai_message(&self, content: impl Into<String>) {
        self.push(BufferedRole::Ai, content.into()).await;
    }

    async fn push(&self, role: BufferedRole, content: String) {
        if content.trim().is_empty() {
            return;
        }
        let mut messages = self.messages.write().await;
        messages.push(BufferedMessage { role, content });

        // Enforce the window in message pairs
        if let Some(max_turns) = self.max_turns {
            let max_messages = max_turns * 2;
            if messages.len() > max_messages {
                let excess = messages.len() - max_messages;
                messages.drain(0..excess);
            }
        }
    }

    /// Render the buffer as a transcript string
    pub async fn buffer_string(&self) -> String {
        let messages = self.messages.read().await;
        messages
            .iter()
            .map(|m| {
                let prefix = match m.role {
                    BufferedRole::Human => &self.human_prefix,
                    BufferedRole::Ai => &self.ai_prefix,
                };
                format!("{}: {}", prefix, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

impl BaseMemory for ConversationBufferMemory {
    fn memory_variables(&self) -> Vec<String> {
        vec![self.memory_key.clone()]
    }

    fn load_memory_variables<'a>(
        &'a self,
        _inputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryVariables, Error>> + Send + 'a>> {
        Box::pin(async move {
            let mut variables = HashMap::new();
            variables.insert(
                self.memory_key.clone(),
                Value::String(self.buffer_string().await),
            );
            Ok(variables)
        })
    }

    fn save_context<'a>(
        &'a self,
        inputs: &'a HashMap<String, Value>,
        outputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(input) = inputs.get("input").and_then(|v| v.as_str()) {
                self.add_user_message(input).await;
            }
            if let Some(output) = outputs.get("output").and_then(|v| v.as_str()) {
                self.add_ai_message(output).await;
            }
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
        Box::pin(async move {
            self.messages.write().await.clear();
            Ok(())
        })
    }

    fn clone_box(&self) -> Box<dyn BaseMemory> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(input: &str, output: &str) -> (HashMap<String, Value>, HashMap<String, Value>) {
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), Value::String(input.to_string()));
        let mut outputs = HashMap::new();
        outputs.insert("output".to_string(), Value::String(output.to_string()));
        (inputs, outputs)
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let memory = ConversationBufferMemory::new();
        let (inputs, outputs) = context("hi there", "hello!");
        memory.save_context(&inputs, &outputs).await.unwrap();

        let variables = memory.load_memory_variables(&HashMap::new()).await.unwrap();
        assert_eq!(
            variables["chat_history"],
            Value::String("Human: hi there\nAI: hello!".to_string())
        );
    }

    #[tokio::test]
    async fn test_window_drops_old_turns() {
        let memory = ConversationBufferMemory::new().with_max_turns(1);
        let (inputs, outputs) = context("first", "one");
        memory.save_context(&inputs, &outputs).await.unwrap();
        let (inputs, outputs) = context("second", "two");
        memory.save_context(&inputs, &outputs).await.unwrap();

        assert_eq!(memory.message_count().await, 2);
        assert_eq!(memory.buffer_string().await, "Human: second\nAI: two");
    }

    #[tokio::test]
    async fn test_custom_prefixes() {
        let memory = ConversationBufferMemory::new().with_prefixes("User", "Assistant");
        memory.add_user_message("q").await;
        memory.add_ai_message("a").await;
        assert_eq!(memory.buffer_string().await, "User: q\nAssistant: a");
    }

    #[tokio::test]
    async fn test_clear() {
        let memory = ConversationBufferMemory::new();
        memory.add_user_message("q").await;
        memory.clear().await.unwrap();
        assert_eq!(memory.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_messages_are_skipped() {
        let memory = ConversationBufferMemory::new();
        memory.add_user_message("   ").await;
        assert_eq!(memory.message_count().await, 0);
    }
}

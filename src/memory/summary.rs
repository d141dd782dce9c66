// Summary memory: folds older turns into a running summary via the model
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use serde_json::Value;
use tokio::sync::RwLock;

use super::base::{BaseMemory, MemoryVariables};
use super::buffer::ConversationBufferMemory;
use super::utils::estimate_token_count;
use crate::models::{ChatMessage, ChatModel};

const SUMMARY_PROMPT: &str = "Please provide a concise summary of the following conversation. \
Focus on the main topics discussed, key decisions made, and any important outcomes.";

// Buffer memory with a compaction step: once the buffered transcript grows
// past `token_threshold` estimated tokens, the whole buffer is folded into
// the running summary with one model call and the buffer is cleared.
pub struct ConversationSummaryMemory {
    model: Arc<dyn ChatModel>,
    buffer: ConversationBufferMemory,
    summary: Arc<RwLock<Option<String>>>,
    memory_key: String,
    token_threshold: usize,
}

impl Clone for ConversationSummaryMemory {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            buffer: self.buffer.clone(),
            summary: Arc::clone(&self.summary),
            memory_key: self.memory_key.clone(),
            token_threshold: self.token_threshold,
        }
    }
}

impl ConversationSummaryMemory {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            buffer: ConversationBufferMemory::new(),
            summary: Arc::new(RwLock::new(None)),
            memory_key: "chat_history".to_string(),
            token_threshold: super::utils::get_summary_threshold_from_env(),
        }
    }

    /// Set the compaction threshold in estimated tokens
    pub fn with_token_threshold(mut self, token_threshold: usize) -> Self {
        self.token_threshold = token_threshold;
        self
    }

    /// Store the rendered history under a different prompt variable
    pub fn with_memory_key(mut self, memory_key: impl Into<String>) -> Self {
        self.memory_key = memory_key.into();
        self
    }

    pub async fn summary(&self) -> Option<String> {
        self.summary.read().await.clone()
    }

    // Fold the buffered turns (and any previous summary) into a new summary
    async fn summarize(&self) -> Result<(), Error> {
        let transcript = self.buffer.buffer_string().await;
        if transcript.is_empty() {
            return Ok(());
        }

        let previous = self.summary.read().await.clone();
        let conversation = match previous {
            Some(previous) => format!(
                "Previous summary:\n{}\n\nNew conversation:\n{}",
                previous, transcript
            ),
            None => transcript,
        };

        let messages = vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::human(conversation),
        ];

        let completion = self.model.invoke(messages, None).await?;
        let new_summary = completion.message.content().trim().to_string();

        info!(
            "Conversation compacted into a {} character summary",
            new_summary.len()
        );

        *self.summary.write().await = Some(new_summary);
        self.buffer.clear().await?;
        Ok(())
    }

    async fn over_threshold(&self) -> bool {
        estimate_token_count(&self.buffer.buffer_string().await) > self.token_threshold
    }
}

impl BaseMemory for ConversationSummaryMemory {
    fn memory_variables(&self) -> Vec<String> {
        vec![self.memory_key.clone()]
    }

    fn load_memory_variables<'a>(
        &'a self,
        _inputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryVariables, Error>> + Send + 'a>> {
        Box::pin(async move {
            let transcript = self.buffer.buffer_string().await;
            let rendered = match self.summary.read().await.as_ref() {
                Some(summary) if transcript.is_empty() => {
                    format!("Summary of the conversation so far: {}", summary)
                }
                Some(summary) => format!(
                    "Summary of the conversation so far: {}\n{}",
                    summary, transcript
                ),
                None => transcript,
            };

            let mut variables = HashMap::new();
            variables.insert(self.memory_key.clone(), Value::String(rendered));
            Ok(variables)
        })
    }

    fn save_context<'a>(
        &'a self,
        inputs: &'a HashMap<String, Value>,
        outputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
        Box::pin(async move {
            self.buffer.save_context(inputs, outputs).await?;
            if self.over_threshold().await {
                self.summarize().await?;
            }
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
        Box::pin(async move {
            self.buffer.clear().await?;
            *self.summary.write().await = None;
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
    use crate::models::{ChatCompletion, ChatMessageContent};

    // Model stub that always answers with a fixed summary
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

    fn context(input: &str, output: &str) -> (HashMap<String, Value>, HashMap<String, Value>) {
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), Value::String(input.to_string()));
        let mut outputs = HashMap::new();
        outputs.insert("output".to_string(), Value::String(output.to_string()));
        (inputs, outputs)
    }

    #[tokio::test]
    async fn test_compaction_runs_over_threshold() {
        let model = Arc::new(FixedModel("they talked about Rust".to_string()));
        let memory = ConversationSummaryMemory::new(model).with_token_threshold(0);

        let (inputs, outputs) = context("tell me about Rust", "it is a systems language");
        memory.save_context(&inputs, &outputs).await.unwrap();

        assert_eq!(memory.summary().await.unwrap(), "they talked about Rust");

        let variables = memory.load_memory_variables(&HashMap::new()).await.unwrap();
        let rendered = variables["chat_history"].as_str().unwrap();
        assert!(rendered.contains("they talked about Rust"));
    }

    #[tokio::test]
    async fn test_no_compaction_under_threshold() {
        let model = Arc::new(FixedModel("unused".to_string()));
        let memory = ConversationSummaryMemory::new(model).with_token_threshold(10_000);

        let (inputs, outputs) = context("hi", "hello");
        memory.save_context(&inputs, &outputs).await.unwrap();

        assert!(memory.summary().await.is_none());
        let variables = memory.load_memory_variables(&HashMap::new()).await.unwrap();
        assert_eq!(
            variables["chat_history"],
            Value::String("Human: hi\nAI: hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_drops_summary() {
        let model = Arc::new(FixedModel("summary".to_string()));
        let memory = ConversationSummaryMemory::new(model).with_token_threshold(0);

        let (inputs, outputs) = context("a", "b");
        memory.save_context(&inputs, &outputs).await.unwrap();
        memory.clear().await.unwrap();

        assert!(memory.summary().await.is_none());
    }
}

// File-persisted conversation history
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::base::{BaseMemory, MemoryVariables};
use super::utils::{atomic_write_file, current_timestamp, ensure_dir_exists, session_file_path};

/// Single stored message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message role: "user" or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
    /// Optional message name
    pub name: Option<String>,
    /// Timestamp (ISO 8601 format)
    pub timestamp: String,
    /// Message sequence number, guarantees ordering
    pub sequence_number: u64,
}

/// Session-level history document, the unit persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionHistory {
    session_id: String,
    created_at: String,
    updated_at: String,
    messages: Vec<StoredMessage>,
}

// One JSON document per session. Writes go through a temp file plus rename
// so a crash never leaves a half-written history behind.
#[derive(Debug)]
pub struct FileChatMessageHistory {
    session_id: String,
    file_path: PathBuf,
    session_history: Arc<RwLock<SessionHistory>>,
    next_sequence_number: Arc<RwLock<u64>>,
}

impl Clone for FileChatMessageHistory {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            file_path: self.file_path.clone(),
            session_history: Arc::clone(&self.session_history),
            next_sequence_number: Arc::clone(&self.next_sequence_number),
        }
    }
}

impl FileChatMessageHistory {
    /// Open (or create) the history for a session
    pub async fn new(session_id: String, file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = file_path.parent() {
            ensure_dir_exists(parent).await?;
        }

        let now = current_timestamp();
        let instance = Self {
            session_id: session_id.clone(),
            file_path,
            session_history: Arc::new(RwLock::new(SessionHistory {
                session_id,
                created_at: now.clone(),
                updated_at: now,
                messages: Vec::new(),
            })),
            next_sequence_number: Arc::new(RwLock::new(1)),
        };

        instance.load().await?;
        Ok(instance)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn load(&self) -> Result<()> {
        if tokio::fs::metadata(&self.file_path).await.is_err() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.file_path).await?;
        if contents.trim().is_empty() {
            return Ok(());
        }

        let loaded: SessionHistory = serde_json::from_str(&contents).map_err(|e| {
            Error::msg(format!(
                "Failed to parse session history '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        let next_seq = loaded
            .messages
            .iter()
            .map(|m| m.sequence_number)
            .max()
            .unwrap_or(0)
            + 1;

        info!(
            "Loaded session history with {} messages for session {}",
            loaded.messages.len(),
            loaded.session_id
        );

        *self.session_history.write().await = loaded;
        *self.next_sequence_number.write().await = next_seq;
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let history = self.session_history.read().await.clone();
        let json_content = serde_json::to_string_pretty(&history)?;
        atomic_write_file(&self.file_path, &json_content).await
    }

    async fn next_sequence(&self) -> u64 {
        let mut seq = self.next_sequence_number.write().await;
        let current = *seq;
        *seq += 1;
        current
    }

    pub async fn add_user_message(&self, content: impl Into<String>) -> Result<()> {
        self.add_message("user", content.into()).await
    }

    pub async fn add_ai_message(&self, content: impl Into<String>) -> Result<()> {
        self.add_message("assistant", content.into()).await
    }

    async fn add_message(&self, role: &str, content: String) -> Result<()> {
        if content.trim().is_empty() {
            return Ok(());
        }

        let message = StoredMessage {
            role: role.to_string(),
            content,
            name: None,
            timestamp: current_timestamp(),
            sequence_number: self.next_sequence().await,
        };

        {
            let mut history = self.session_history.write().await;
            history.messages.push(message);
            history.updated_at = current_timestamp();
        }

        self.save().await
    }

    pub async fn messages(&self) -> Vec<StoredMessage> {
        self.session_history.read().await.messages.clone()
    }

    pub async fn clear(&self) -> Result<()> {
        {
            let mut history = self.session_history.write().await;
            history.messages.clear();
            history.updated_at = current_timestamp();
        }
        *self.next_sequence_number.write().await = 1;
        self.save().await
    }
}

// BaseMemory over a file-backed session: loads the most recent messages as
// a transcript string, persists each finished turn.
#[derive(Debug)]
pub struct MessageHistoryMemory {
    session_id: String,
    chat_history: FileChatMessageHistory,
    recent_count: usize,
}

impl Clone for MessageHistoryMemory {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            chat_history: self.chat_history.clone(),
            recent_count: self.recent_count,
        }
    }
}

impl MessageHistoryMemory {
    /// Create with the environment-configured recent-message count
    pub async fn new(session_id: String, data_dir: PathBuf) -> Result<Self> {
        let recent_count = super::utils::get_recent_messages_count_from_env();
        Self::with_recent_count(session_id, data_dir, recent_count).await
    }

    pub async fn with_recent_count(
        session_id: String,
        data_dir: PathBuf,
        recent_count: usize,
    ) -> Result<Self> {
        ensure_dir_exists(&data_dir).await?;

        let file_path = session_file_path(&data_dir, &session_id, "history.json");
        let chat_history = FileChatMessageHistory::new(session_id.clone(), file_path).await?;

        Ok(Self {
            session_id,
            chat_history,
            recent_count,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn recent_messages(&self, count: usize) -> Vec<StoredMessage> {
        let messages = self.chat_history.messages().await;
        let skip = messages.len().saturating_sub(count);
        messages.into_iter().skip(skip).collect()
    }

    pub async fn message_count(&self) -> usize {
        self.chat_history.messages().await.len()
    }

    fn render(&self, messages: &[StoredMessage]) -> String {
        messages
            .iter()
            .map(|m| {
                let prefix = if m.role == "user" { "Human" } else { "AI" };
                format!("{}: {}", prefix, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl BaseMemory for MessageHistoryMemory {
    fn memory_variables(&self) -> Vec<String> {
        vec!["chat_history".to_string()]
    }

    fn load_memory_variables<'a>(
        &'a self,
        _inputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryVariables, Error>> + Send + 'a>> {
        Box::pin(async move {
            let messages = self.recent_messages(self.recent_count).await;
            let mut variables = HashMap::new();
            variables.insert(
                "chat_history".to_string(),
                Value::String(self.render(&messages)),
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
                self.chat_history.add_user_message(input).await?;
            }
            if let Some(output) = outputs.get("output").and_then(|v| v.as_str()) {
                self.chat_history.add_ai_message(output).await?;
            }
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
        Box::pin(async move { self.chat_history.clear().await })
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
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().to_path_buf();

        {
            let memory = MessageHistoryMemory::with_recent_count(
                "session-1".to_string(),
                data_dir.clone(),
                10,
            )
            .await
            .unwrap();
            memory.chat_history.add_user_message("question").await.unwrap();
            memory.chat_history.add_ai_message("answer").await.unwrap();
        }

        // Reopen the same session from disk
        let memory =
            MessageHistoryMemory::with_recent_count("session-1".to_string(), data_dir, 10)
                .await
                .unwrap();
        let messages = memory.chat_history.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "question");
        assert_eq!(messages[1].sequence_number, 2);
    }

    #[tokio::test]
    async fn test_recent_messages_truncation() {
        let temp_dir = TempDir::new().unwrap();
        let memory = MessageHistoryMemory::with_recent_count(
            "session-2".to_string(),
            temp_dir.path().to_path_buf(),
            2,
        )
        .await
        .unwrap();

        for i in 0..3 {
            memory
                .chat_history
                .add_user_message(format!("message {}", i))
                .await
                .unwrap();
        }

        let variables = memory.load_memory_variables(&HashMap::new()).await.unwrap();
        let rendered = variables["chat_history"].as_str().unwrap();
        assert!(!rendered.contains("message 0"));
        assert!(rendered.contains("message 1"));
        assert!(rendered.contains("message 2"));
    }

    #[tokio::test]
    async fn test_clear_resets_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let memory = MessageHistoryMemory::with_recent_count(
            "session-3".to_string(),
            temp_dir.path().to_path_buf(),
            10,
        )
        .await
        .unwrap();

        memory.chat_history.add_user_message("one").await.unwrap();
        memory.chat_history.clear().await.unwrap();
        memory.chat_history.add_user_message("two").await.unwrap();

        let messages = memory.chat_history.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sequence_number, 1);
    }

    #[tokio::test]
    async fn test_save_context_via_base_memory() {
        let temp_dir = TempDir::new().unwrap();
        let memory = MessageHistoryMemory::with_recent_count(
            "session-4".to_string(),
            temp_dir.path().to_path_buf(),
            10,
        )
        .await
        .unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), Value::String("hi".to_string()));
        let mut outputs = HashMap::new();
        outputs.insert("output".to_string(), Value::String("hello".to_string()));
        memory.save_context(&inputs, &outputs).await.unwrap();

        assert_eq!(memory.message_count().await, 2);
    }
}

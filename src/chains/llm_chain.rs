// LLM chain: prompt template + chat model + optional memory
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;
use serde_json::Value;

use crate::callbacks::CallbackHandler;
use crate::core::Runnable;
use crate::memory::BaseMemory;
use crate::models::{ChatMessage, ChatModel};
use crate::prompt::PromptTemplate;

// The basic unit of work: render the prompt from the inputs (plus whatever
// the memory contributes), send it to the model, hand the completion back.
pub struct LLMChain {
    model: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    memory: Option<Box<dyn BaseMemory>>,
    callbacks: Vec<Arc<dyn CallbackHandler>>,
    stop: Option<Vec<String>>,
}

impl Clone for LLMChain {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            prompt: self.prompt.clone(),
            memory: self.memory.clone(),
            callbacks: self.callbacks.clone(),
            stop: self.stop.clone(),
        }
    }
}

impl LLMChain {
    pub fn new(model: Arc<dyn ChatModel>, prompt: PromptTemplate) -> Self {
        Self {
            model,
            prompt,
            memory: None,
            callbacks: Vec::new(),
            stop: None,
        }
    }

    /// Attach a memory that feeds its variables into the prompt and records
    /// each finished turn
    pub fn with_memory(mut self, memory: Box<dyn BaseMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Register a callback handler
    pub fn with_callback(mut self, callback: Arc<dyn CallbackHandler>) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Cut completions at these stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Run the chain and return the raw completion text.
    pub async fn predict(&self, inputs: &HashMap<String, String>) -> Result<String, Error> {
        for callback in &self.callbacks {
            callback.on_chain_start("llm_chain");
        }

        let result = self.predict_inner(inputs).await;

        match &result {
            Ok(_) => {
                for callback in &self.callbacks {
                    callback.on_chain_end("llm_chain");
                }
            }
            Err(e) => {
                for callback in &self.callbacks {
                    callback.on_chain_error("llm_chain", &e.to_string());
                }
            }
        }

        result
    }

    async fn predict_inner(&self, inputs: &HashMap<String, String>) -> Result<String, Error> {
        let mut full_inputs = inputs.clone();

        // Memory variables fill prompt slots the caller did not provide
        if let Some(memory) = &self.memory {
            let variables = memory.load_memory_variables(&HashMap::new()).await?;
            for (key, value) in variables {
                let rendered = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                full_inputs.entry(key).or_insert(rendered);
            }
        }

        let rendered = self.prompt.format(&full_inputs)?;
        let model_name = self.model.model_name().unwrap_or("unknown").to_string();

        for callback in &self.callbacks {
            callback.on_llm_start(&model_name, std::slice::from_ref(&rendered));
        }

        let completion = self
            .model
            .invoke(vec![ChatMessage::human(rendered)], self.stop.clone())
            .await;

        let completion = match completion {
            Ok(completion) => completion,
            Err(e) => {
                for callback in &self.callbacks {
                    callback.on_llm_error(&model_name, &e.to_string());
                }
                return Err(e);
            }
        };

        for callback in &self.callbacks {
            callback.on_llm_end(&completion.model_name);
        }

        let output = completion.message.content().to_string();

        if let Some(memory) = &self.memory {
            let mut mem_inputs = HashMap::new();
            if let Some(input) = inputs.get("input") {
                mem_inputs.insert("input".to_string(), Value::String(input.clone()));
            }
            let mut mem_outputs = HashMap::new();
            mem_outputs.insert("output".to_string(), Value::String(output.clone()));
            memory.save_context(&mem_inputs, &mem_outputs).await?;
        }

        Ok(output)
    }
}

impl Runnable<HashMap<String, String>, String> for LLMChain {
    fn invoke(
        &self,
        input: HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<String, Error>> + Send>> {
        let chain = self.clone();
        Box::pin(async move { chain.predict(&input).await })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<HashMap<String, String>, String> + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationBufferMemory;
    use crate::models::{ChatCompletion, ChatMessageContent};
    use std::future::Future;
    use std::sync::Mutex;

    // Records the rendered prompt it receives, answers with a fixed string
    struct RecordingModel {
        seen: Mutex<Vec<String>>,
        reply: String,
    }

    impl RecordingModel {
        fn new(reply: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply: reply.to_string(),
            }
        }
    }

    impl ChatModel for RecordingModel {
        fn invoke(
            &self,
            messages: Vec<ChatMessage>,
            _stop: Option<Vec<String>>,
        ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, Error>> + Send + '_>> {
            let prompt = messages
                .first()
                .map(|m| m.content().to_string())
                .unwrap_or_default();
            self.seen.lock().unwrap().push(prompt);
            let reply = self.reply.clone();
            Box::pin(async move {
                Ok(ChatCompletion {
                    message: ChatMessage::Ai(ChatMessageContent::new(reply)),
                    usage: None,
                    model_name: "recording".to_string(),
                })
            })
        }
    }

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_predict_renders_prompt() {
        let model = Arc::new(RecordingModel::new("four"));
        let chain = LLMChain::new(
            model.clone(),
            PromptTemplate::from_template("Q: {input}\nA:"),
        );

        let output = chain.predict(&inputs(&[("input", "2 + 2?")])).await.unwrap();
        assert_eq!(output, "four");
        assert_eq!(model.seen.lock().unwrap()[0], "Q: 2 + 2?\nA:");
    }

    #[tokio::test]
    async fn test_memory_fills_history_and_records_turn() {
        let model = Arc::new(RecordingModel::new("fine, thanks"));
        let memory = ConversationBufferMemory::new();
        memory.add_user_message("hello").await;
        memory.add_ai_message("hi!").await;

        let chain = LLMChain::new(
            model.clone(),
            PromptTemplate::from_template("{chat_history}\nHuman: {input}\nAI:"),
        )
        .with_memory(Box::new(memory.clone()));

        let output = chain.predict(&inputs(&[("input", "how are you?")])).await.unwrap();
        assert_eq!(output, "fine, thanks");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0], "Human: hello\nAI: hi!\nHuman: how are you?\nAI:");
        drop(seen);

        // The new turn landed in memory
        assert_eq!(memory.message_count().await, 4);
    }

    #[tokio::test]
    async fn test_invoke_via_runnable() {
        let model = Arc::new(RecordingModel::new("done"));
        let chain = LLMChain::new(model, PromptTemplate::from_template("{input}"));

        let output = chain.invoke(inputs(&[("input", "run")])).await.unwrap();
        assert_eq!(output, "done");
    }
}

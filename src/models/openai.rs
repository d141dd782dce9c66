// OpenAI-compatible chat completions client
use std::collections::HashMap;

use anyhow::Error;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chat::{ChatCompletion, ChatModel};
use super::message::{ChatMessage, ChatMessageContent, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize, Deserialize, Clone)]
struct OpenAIMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    role: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

// Chat model backed by any endpoint speaking the OpenAI chat completions
// wire format (OpenAI itself, or a compatible gateway via a custom base URL).
#[derive(Clone)]
pub struct OpenAIChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    additional_headers: HashMap<String, String>,
    additional_params: HashMap<String, Value>,
}

impl OpenAIChatModel {
    /// Create a new client. Pass `None` for the official OpenAI endpoint.
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_name: None,
            temperature: Some(0.7),
            max_tokens: None,
            additional_headers: HashMap::new(),
            additional_params: HashMap::new(),
        }
    }

    /// Set model name
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add an extra request header (gateways often want one)
    pub fn with_additional_header(mut self, key: String, value: String) -> Self {
        self.additional_headers.insert(key, value);
        self
    }

    /// Add an extra request body parameter
    pub fn with_additional_param(mut self, key: String, value: Value) -> Self {
        self.additional_params.insert(key, value);
        self
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| {
                let (role, content) = match msg {
                    ChatMessage::System(c) => ("system", c),
                    ChatMessage::Human(c) => ("user", c),
                    ChatMessage::Ai(c) => ("assistant", c),
                    ChatMessage::Tool(c) => ("tool", c),
                };
                OpenAIMessage {
                    role: role.to_string(),
                    content: content.content.clone(),
                    name: content.name.clone(),
                }
            })
            .collect()
    }

    // Request body assembly, kept free of I/O so it can be tested directly
    fn build_request_body(&self, messages: &[ChatMessage], stop: Option<&[String]>) -> Value {
        let openai_messages = Self::convert_messages(messages);

        let mut request_body = serde_json::json!({
            "messages": openai_messages,
            "model": self.model_name.clone().unwrap_or_default(),
        });

        if let Some(temp) = self.temperature {
            request_body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = self.max_tokens {
            request_body["max_tokens"] = serde_json::json!(max);
        }
        if let Some(stop) = stop {
            if !stop.is_empty() {
                request_body["stop"] = serde_json::json!(stop);
            }
        }

        for (key, value) in &self.additional_params {
            request_body[key.as_str()] = value.clone();
        }

        request_body
    }
}

impl ChatModel for OpenAIChatModel {
    fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        stop: Option<Vec<String>>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ChatCompletion, Error>> + Send + '_>,
    > {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let api_url = format!("{}/chat/completions", self.base_url);
        let additional_headers = self.additional_headers.clone();
        let request_body = self.build_request_body(&messages, stop.as_deref());

        Box::pin(async move {
            debug!("POST {} ({} messages)", api_url, messages.len());

            let mut request = client
                .post(&api_url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json");

            for (key, value) in additional_headers {
                request = request.header(key, value);
            }

            let response = request.json(&request_body).send().await?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await?;
                return Err(Error::msg(format!(
                    "API request failed: {} - {}",
                    status, error_text
                )));
            }

            let response: OpenAIResponse = response.json().await?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| Error::msg("No choices returned from API"))?;
            if choice.message.role != "assistant" {
                return Err(Error::msg(format!(
                    "Unexpected message role: {}",
                    choice.message.role
                )));
            }

            let message = ChatMessage::Ai(ChatMessageContent::new(
                choice.message.content.clone().unwrap_or_default(),
            ));

            let usage = response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

            Ok(ChatCompletion {
                message,
                usage,
                model_name: response.model.unwrap_or_else(|| "unknown".to_string()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OpenAIChatModel {
        OpenAIChatModel::new("test-key".to_string(), None)
            .with_model("gpt-3.5-turbo")
            .with_temperature(0.0)
            .with_max_tokens(256)
    }

    #[test]
    fn test_request_body_basics() {
        let body = model().build_request_body(&[ChatMessage::human("hi")], None);

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_request_body_stop_sequences() {
        let stop = vec!["\nObservation:".to_string()];
        let body = model().build_request_body(&[ChatMessage::human("hi")], Some(&stop));

        assert_eq!(body["stop"][0], "\nObservation:");
    }

    #[test]
    fn test_request_body_additional_params() {
        let body = model()
            .with_additional_param("top_p".to_string(), serde_json::json!(0.9))
            .build_request_body(&[ChatMessage::human("hi")], None);

        assert_eq!(body["top_p"], 0.9);
    }

    #[test]
    fn test_custom_base_url() {
        let model = OpenAIChatModel::new(
            "key".to_string(),
            Some("http://localhost:8080/v1".to_string()),
        );
        assert_eq!(model.base_url(), "http://localhost:8080/v1");
    }
}

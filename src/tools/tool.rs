// Tool interface and implementation
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error;
use async_trait::async_trait;

// Minimal tool interface: a named callable with a text-in/text-out signature.
// The description is what the model sees when deciding which tool to pick,
// so it should say what the tool is for and what the input looks like.
#[async_trait]
pub trait Tool: Send + Sync {
    // Basic tool information
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    // Core execution method
    async fn invoke(&self, input: &str) -> Result<String, Error>;

    // Runtime type checking support
    fn as_any(&self) -> &dyn std::any::Any;
}

// Toolkit interface: a named collection of tools handed out together
pub trait Toolkit {
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

type ToolHandler = dyn Fn(String) -> Pin<Box<dyn std::future::Future<Output = Result<String, Error>> + Send>>
    + Send
    + Sync;

// Tool built from an async closure. This is the plain "tool record"
// (name, callable, description) for callers that do not want a dedicated type.
#[derive(Clone)]
pub struct SimpleTool {
    name: String,
    description: String,
    handler: Arc<ToolHandler>,
}

impl SimpleTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<String, Error>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Arc::new(move |input| {
                let fut = handler(input);
                Box::pin(fut)
                    as Pin<Box<dyn std::future::Future<Output = Result<String, Error>> + Send>>
            }),
        }
    }
}

#[async_trait]
impl Tool for SimpleTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str) -> Result<String, Error> {
        (self.handler)(input.to_string()).await
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_tool_invokes_handler() {
        let tool = SimpleTool::new("echo", "Echo the input back.", |input| async move {
            Ok(format!("echo: {}", input))
        });

        assert_eq!(tool.name(), "echo");
        let output = tool.invoke("hello").await.unwrap();
        assert_eq!(output, "echo: hello");
    }
}

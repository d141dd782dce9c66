// Callback handler interface definition
use log::{debug, info, warn};

use crate::agents::{AgentAction, AgentFinish};

// Minimal callback system. Every hook has a no-op default so handlers only
// implement what they care about.
pub trait CallbackHandler: Send + Sync {
    // LLM related callbacks
    fn on_llm_start(&self, _model_name: &str, _prompts: &[String]) {}

    fn on_llm_new_token(&self, _token: &str) {}

    fn on_llm_end(&self, _model_name: &str) {}

    fn on_llm_error(&self, _model_name: &str, _error: &str) {}

    // Tool related callbacks
    fn on_tool_start(&self, _tool_name: &str, _input: &str) {}

    fn on_tool_end(&self, _tool_name: &str, _output: &str) {}

    fn on_tool_error(&self, _tool_name: &str, _error: &str) {}

    // Chain related callbacks
    fn on_chain_start(&self, _chain_name: &str) {}

    fn on_chain_end(&self, _chain_name: &str) {}

    fn on_chain_error(&self, _chain_name: &str, _error: &str) {}

    // Agent related callbacks
    fn on_agent_action(&self, _action: &AgentAction) {}

    fn on_agent_finish(&self, _finish: &AgentFinish) {}
}

// Forwards every hook to the log facade
#[derive(Clone, Copy, Default)]
pub struct LogCallbackHandler;

impl LogCallbackHandler {
    pub fn new() -> Self {
        Self
    }
}

impl CallbackHandler for LogCallbackHandler {
    fn on_llm_start(&self, model_name: &str, prompts: &[String]) {
        debug!("LLM call starting: model={} prompts={}", model_name, prompts.len());
    }

    fn on_llm_end(&self, model_name: &str) {
        debug!("LLM call finished: model={}", model_name);
    }

    fn on_llm_error(&self, model_name: &str, error: &str) {
        warn!("LLM call failed: model={} error={}", model_name, error);
    }

    fn on_tool_start(&self, tool_name: &str, input: &str) {
        info!("Invoking tool {} with input: {}", tool_name, input);
    }

    fn on_tool_end(&self, tool_name: &str, output: &str) {
        debug!("Tool {} returned: {}", tool_name, output);
    }

    fn on_tool_error(&self, tool_name: &str, error: &str) {
        warn!("Tool {} failed: {}", tool_name, error);
    }

    fn on_chain_start(&self, chain_name: &str) {
        debug!("Chain {} starting", chain_name);
    }

    fn on_chain_end(&self, chain_name: &str) {
        debug!("Chain {} finished", chain_name);
    }

    fn on_chain_error(&self, chain_name: &str, error: &str) {
        warn!("Chain {} failed: {}", chain_name, error);
    }

    fn on_agent_action(&self, action: &AgentAction) {
        info!(
            "Agent action: tool={} input={}",
            action.tool, action.tool_input
        );
    }

    fn on_agent_finish(&self, finish: &AgentFinish) {
        info!(
            "Agent finished: {}",
            finish
                .return_values
                .get("output")
                .map(String::as_str)
                .unwrap_or("")
        );
    }
}

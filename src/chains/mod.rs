// Chains module definition
mod llm_chain;

// Re-export module content
pub use llm_chain::LLMChain;

// Prompt module definition
mod template;

// Re-export module content
pub use template::PromptTemplate;

// Callbacks module definition
mod handler;

// Re-export module content
pub use handler::{CallbackHandler, LogCallbackHandler};

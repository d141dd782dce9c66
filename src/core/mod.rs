// Core module definition
mod runnable;

// Re-export module content
pub use runnable::{pipe, Runnable, RunnableExt, RunnableSequence};

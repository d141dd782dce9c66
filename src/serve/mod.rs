// Serve module definition
mod server;

// Re-export module content
pub use server::AgentServer;

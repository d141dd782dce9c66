// Basic memory interface definition
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::Error;
use serde_json::Value;

// Memory variable type alias
pub type MemoryVariables = HashMap<String, Value>;

// Minimal memory abstraction: load variables into a prompt before a call,
// save the {input, output} pair of a finished turn afterwards.
pub trait BaseMemory: Send + Sync {
    // Get memory variable names
    fn memory_variables(&self) -> Vec<String>;

    // Core method: load memory variables
    fn load_memory_variables<'a>(
        &'a self,
        inputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryVariables, Error>> + Send + 'a>>;

    // Core method: save context
    fn save_context<'a>(
        &'a self,
        inputs: &'a HashMap<String, Value>,
        outputs: &'a HashMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

    // Clear memory
    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

    // Clone method
    fn clone_box(&self) -> Box<dyn BaseMemory>;

    // Runtime type checking support
    fn as_any(&self) -> &dyn std::any::Any;
}

impl Clone for Box<dyn BaseMemory> {
    fn clone(&self) -> Self {
        self.as_ref().clone_box()
    }
}

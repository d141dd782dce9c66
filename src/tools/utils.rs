// Tool lookup helpers
use std::sync::Arc;

use crate::tools::Tool;

/// Resolve a tool name produced by the model against the registered tools.
/// Models frequently vary the casing or add qualifiers ("Search", "web
/// search"), so after an exact match we fall back to case-insensitive and
/// containment matching in either direction.
pub fn find_matching_tool(tools: &[Arc<dyn Tool>], requested: &str) -> Option<Arc<dyn Tool>> {
    let requested = requested.trim();

    // 1. Exact match
    if let Some(tool) = tools.iter().find(|t| t.name() == requested) {
        return Some(Arc::clone(tool));
    }

    // 2. Case-insensitive match
    let requested_lower = requested.to_lowercase();
    if let Some(tool) = tools
        .iter()
        .find(|t| t.name().to_lowercase() == requested_lower)
    {
        return Some(Arc::clone(tool));
    }

    // 3. Containment in either direction
    for tool in tools {
        let tool_name_lower = tool.name().to_lowercase();
        if tool_name_lower.contains(&requested_lower) || requested_lower.contains(&tool_name_lower)
        {
            return Some(Arc::clone(tool));
        }
    }

    None
}

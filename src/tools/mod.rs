// Tools module definition
mod calculator;
mod search;
mod tool;
mod utils;

// Re-export module content
pub use calculator::Calculator;
pub use search::SerpApiSearch;
pub use tool::{SimpleTool, Tool, Toolkit};
pub use utils::find_matching_tool;

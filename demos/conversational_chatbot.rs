// Conversational agent chatbot with buffer memory
use std::collections::HashMap;
use std::sync::Arc;

use log::{info, LevelFilter};
use reagent::{
    initialize_agent, AgentType, BaseMemory, Calculator, ChatModel, LogCallbackHandler,
    OpenAIChatModel, SerpApiSearch, Settings, Tool,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let settings = Settings::load().expect("Failed to load settings");

    let model = OpenAIChatModel::new(settings.llm.api_key.clone(), settings.llm.base_url.clone())
        .with_model(settings.llm.model.clone())
        .with_temperature(settings.llm.temperature)
        .with_max_tokens(settings.llm.max_tokens);

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(
            SerpApiSearch::new(settings.search.api_key.clone())
                .with_num_results(settings.search.num_results),
        ),
        Arc::new(Calculator::new()),
    ];

    info!("Using model: {}", model.model_name().unwrap_or("unknown"));

    let executor = initialize_agent(
        tools,
        Arc::new(model),
        AgentType::ConversationalReactDescription,
    )
    .with_callback(Arc::new(LogCallbackHandler::new()));

    println!("Conversational agent chatbot started!");
    println!("Available tools:");
    for (index, tool) in executor.tools().iter().enumerate() {
        println!("{}. {}: {}", index + 1, tool.name(), tool.description());
    }
    println!("Type 'exit' to end the conversation");
    println!("----------------------------------------");

    loop {
        let mut user_input = String::new();
        println!("You: ");
        std::io::stdin()
            .read_line(&mut user_input)
            .expect("Failed to read input");
        let user_input = user_input.trim();

        if user_input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }
        if user_input.is_empty() {
            continue;
        }

        match executor.run(user_input).await {
            Ok(response) => println!("Assistant: {}", response),
            Err(e) => println!("Assistant: sorry, something went wrong: {}", e),
        }
    }

    // Print the conversation history before exiting
    if let Some(memory) = executor.memory() {
        if let Ok(variables) = memory.load_memory_variables(&HashMap::new()).await {
            if let Some(history) = variables.get("chat_history").and_then(|v| v.as_str()) {
                info!("Conversation history:\n{}", history);
            }
        }
    }
}

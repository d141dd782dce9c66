// Zero-shot ReAct agent over a search engine and a calculator
use std::sync::Arc;

use log::{info, LevelFilter};
use reagent::{
    initialize_agent, AgentType, Calculator, ChatModel, OpenAIChatModel, SerpApiSearch, Settings,
    Tool,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let settings = Settings::load().expect("Failed to load settings");

    let model = OpenAIChatModel::new(settings.llm.api_key.clone(), settings.llm.base_url.clone())
        .with_model(settings.llm.model.clone())
        .with_temperature(0.0)
        .with_max_tokens(settings.llm.max_tokens);

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(
            SerpApiSearch::new(settings.search.api_key.clone())
                .with_num_results(settings.search.num_results),
        ),
        Arc::new(Calculator::new()),
    ];

    info!("Using model: {}", model.model_name().unwrap_or("unknown"));
    info!("Using API URL: {}", model.base_url());

    let executor = initialize_agent(tools, Arc::new(model), AgentType::ZeroShotReactDescription);

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Who is the current president of France, and what is 37593 * 67?".to_string());

    println!("Question: {}", question);
    match executor.run(&question).await {
        Ok(answer) => println!("Answer: {}", answer),
        Err(e) => eprintln!("Agent run failed: {}", e),
    }
}

// Hosted web search tool backed by SerpAPI (Google results)
use anyhow::Error;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::tool::Tool;

const SERPAPI_URL: &str = "https://serpapi.com/search";

const SEARCH_DESCRIPTION: &str = "A search engine. Useful for when you need to answer questions \
about current events or facts you do not know. The input should be a search query.";

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    answer_box: Option<AnswerBox>,
    organic_results: Option<Vec<OrganicResult>>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

// Text-in/text-out wrapper over the SerpAPI Google engine. The answer box
// is preferred when the API provides one, otherwise the top organic results
// are rendered as numbered lines for the model to read.
#[derive(Clone)]
pub struct SerpApiSearch {
    client: Client,
    api_key: String,
    num_results: usize,
}

impl SerpApiSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            num_results: 5,
        }
    }

    /// Set how many organic results to render
    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results.max(1);
        self
    }

    async fn search(&self, query: &str) -> Result<SerpApiResponse, Error> {
        debug!("Searching SerpAPI for: {}", query);

        let num_results = self.num_results.to_string();
        let response = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("num", num_results.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return match status.as_u16() {
                401 => Err(Error::msg("SerpAPI rejected the API key")),
                429 => Err(Error::msg("SerpAPI rate limit exceeded")),
                _ => {
                    let error_text = response.text().await.unwrap_or_default();
                    Err(Error::msg(format!(
                        "SerpAPI request failed: {} - {}",
                        status, error_text
                    )))
                }
            };
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Tool for SerpApiSearch {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        SEARCH_DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<String, Error> {
        let response = self.search(input).await?;
        Ok(render_results(&response, self.num_results))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// Render the API response into the observation string fed back to the model
fn render_results(response: &SerpApiResponse, num_results: usize) -> String {
    if let Some(answer_box) = &response.answer_box {
        if let Some(answer) = answer_box.answer.as_ref().or(answer_box.snippet.as_ref()) {
            return answer.clone();
        }
    }

    let Some(results) = response.organic_results.as_ref().filter(|r| !r.is_empty()) else {
        return "No good search result found.".to_string();
    };

    results
        .iter()
        .take(num_results)
        .enumerate()
        .map(|(i, r)| {
            let title = r.title.as_deref().unwrap_or("Untitled");
            let snippet = r.snippet.as_deref().unwrap_or("");
            match r.link.as_deref() {
                Some(link) => format!("{}. {} - {} ({})", i + 1, title, snippet, link),
                None => format!("{}. {} - {}", i + 1, title, snippet),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

use super::{EvidenceFact, ReverseImageSearchService};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";
const MAX_IMAGE_RESULTS: usize = 5;
const MAX_SNIPPETS: usize = 3;
const DEFAULT_RESULTS_STATE: &str = "Results for exact spelling";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReverseImageResponse {
    error: Option<String>,
    image_results: Option<Vec<ImageResult>>,
    knowledge_graph: Option<Value>,
    suggested_searches: Option<Vec<SuggestedSearch>>,
    best_guess: Option<Value>,
    inline_images: Option<Vec<Value>>,
    organic_results: Option<Vec<OrganicResult>>,
    search_information: Option<SearchInformation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageResult {
    title: Option<String>,
    source: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestedSearch {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganicResult {
    snippet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchInformation {
    query_displayed: Option<String>,
    total_results: Option<Value>,
    organic_results_state: Option<String>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a provider payload into ordered evidence facts.
fn evidence_from_response(payload: &ReverseImageResponse) -> Vec<EvidenceFact> {
    if let Some(error) = &payload.error {
        return vec![EvidenceFact::ProviderError(error.clone())];
    }

    let mut facts = Vec::new();

    if let Some(results) = payload.image_results.as_ref().filter(|r| !r.is_empty()) {
        facts.push(EvidenceFact::SimilarImages(results.len()));
        facts.extend(
            results
                .iter()
                .take(MAX_IMAGE_RESULTS)
                .enumerate()
                .map(|(idx, result)| EvidenceFact::ImageResult {
                    rank: idx + 1,
                    title: result.title.clone(),
                    source: result.source.clone(),
                    link: result.link.clone(),
                })
                .filter(|fact| !fact.lines().is_empty()),
        );
    }

    if let Some(Value::Object(graph)) = &payload.knowledge_graph {
        facts.extend(graph.iter().map(|(key, value)| EvidenceFact::Knowledge {
            key: key.clone(),
            value: value_text(value),
        }));
    }

    if let Some(suggestions) = &payload.suggested_searches {
        facts.extend(
            suggestions
                .iter()
                .map(|s| EvidenceFact::SuggestedSearch(s.name.clone().unwrap_or_default())),
        );
    }

    if let Some(best_guess) = payload.best_guess.as_ref().filter(|v| !v.is_null()) {
        facts.push(EvidenceFact::BestGuess(value_text(best_guess)));
    }

    if let Some(inline) = &payload.inline_images {
        facts.push(EvidenceFact::InlineImages(inline.len()));
    }

    if let Some(organic) = &payload.organic_results {
        facts.extend(
            organic
                .iter()
                .take(MAX_SNIPPETS)
                .filter_map(|r| r.snippet.clone())
                .map(EvidenceFact::Snippet),
        );
    }

    if let Some(info) = &payload.search_information {
        if let Some(query) = &info.query_displayed {
            facts.push(EvidenceFact::IdentifiedAs(query.clone()));
        }
        if let Some(total) = &info.total_results {
            facts.push(EvidenceFact::TotalResults(value_text(total)));
        }
        match info.organic_results_state.as_deref() {
            Some("Fully empty") => facts.push(EvidenceFact::NoOrganicMatches),
            Some(state) if state != DEFAULT_RESULTS_STATE => {
                facts.push(EvidenceFact::SearchState(state.to_string()));
            }
            _ => {}
        }
    }

    if facts.is_empty() {
        facts.push(EvidenceFact::NoResults);
    }

    facts
}

/// SerpAPI `google_reverse_image` client.
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SerpApiClient {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for SerpApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReverseImageSearchService for SerpApiClient {
    async fn search(&self, image_url: &str, api_key: &str) -> Result<Vec<EvidenceFact>> {
        tracing::info!("Requesting reverse image search for {}", image_url);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .timeout(self.timeout)
            .query(&[
                ("engine", "google_reverse_image"),
                ("image_url", image_url),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to SerpAPI: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("SerpAPI error (status {}): {}", status, error_text);
            return Err(Error::Search(format!(
                "SerpAPI error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let payload: ReverseImageResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse SerpAPI response: {}\nBody: {}", e, body);
            Error::Search(format!("Failed to parse SerpAPI response: {}", e))
        })?;

        let facts = evidence_from_response(&payload);
        if facts == [EvidenceFact::NoResults] {
            tracing::info!("SerpAPI returned no results for {}", image_url);
        }
        tracing::debug!("SerpAPI evidence: {:?}", facts);

        Ok(facts)
    }
}

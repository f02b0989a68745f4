//! Reverse image search
//!
//! The provider response is normalized into an ordered list of
//! [`EvidenceFact`]s. Text rendering is a separate step so the content can
//! be inspected without substring matching.

pub mod mock;
pub mod serpapi;

pub use mock::MockSearchClient;
pub use serpapi::SerpApiClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ReverseImageSearchService: Send + Sync {
    /// Search for `image_url`. Transport, status and decoding failures are
    /// errors; a provider-reported error comes back as evidence.
    async fn search(&self, image_url: &str, api_key: &str) -> Result<Vec<EvidenceFact>>;
}

/// One normalized piece of search evidence, in provider priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceFact {
    /// The provider reported an error instead of results.
    ProviderError(String),
    SimilarImages(usize),
    ImageResult {
        rank: usize,
        title: Option<String>,
        source: Option<String>,
        link: Option<String>,
    },
    Knowledge {
        key: String,
        value: String,
    },
    SuggestedSearch(String),
    BestGuess(String),
    InlineImages(usize),
    Snippet(String),
    IdentifiedAs(String),
    TotalResults(String),
    NoOrganicMatches,
    SearchState(String),
    /// Search ran but nothing informative came back.
    NoResults,
}

impl EvidenceFact {
    pub fn lines(&self) -> Vec<String> {
        match self {
            EvidenceFact::ProviderError(message) => vec![format!("Error: {}", message)],
            EvidenceFact::SimilarImages(count) => {
                vec![format!("Found {} similar images on Google", count)]
            }
            EvidenceFact::ImageResult {
                rank,
                title,
                source,
                link,
            } => {
                let mut lines = Vec::new();
                if let Some(title) = title {
                    lines.push(format!("Result {}: {}", rank, title));
                }
                if let Some(source) = source {
                    lines.push(format!("  Source: {}", source));
                }
                if let Some(link) = link {
                    lines.push(format!("  URL: {}", link));
                }
                lines
            }
            EvidenceFact::Knowledge { key, value } => vec![format!("{}: {}", key, value)],
            EvidenceFact::SuggestedSearch(name) => vec![format!("Suggested search: {}", name)],
            EvidenceFact::BestGuess(guess) => vec![format!("Best guess: {}", guess)],
            EvidenceFact::InlineImages(count) => {
                vec![format!("Found {} similar images.", count)]
            }
            EvidenceFact::Snippet(snippet) => vec![format!("Snippet: {}", snippet)],
            EvidenceFact::IdentifiedAs(query) => vec![format!("Google identified as: {}", query)],
            EvidenceFact::TotalResults(total) => vec![format!("Total results found: {}", total)],
            EvidenceFact::NoOrganicMatches => {
                vec!["Google found no matching results for this image".to_string()]
            }
            EvidenceFact::SearchState(state) => vec![format!("Search state: {}", state)],
            EvidenceFact::NoResults => vec![
                "No search results found for this image".to_string(),
                "This could mean the image is unique or not widely available online".to_string(),
            ],
        }
    }
}

/// Render facts as newline-separated evidence text; `None` when there is nothing.
pub fn render_evidence(facts: &[EvidenceFact]) -> Option<String> {
    let lines: Vec<String> = facts.iter().flat_map(EvidenceFact::lines).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

use super::{EvidenceFact, ReverseImageSearchService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockSearchResponse {
    Facts(Vec<EvidenceFact>),
    Failure(String),
}

/// Recorded `(image_url, api_key)` of each search call.
pub type SearchCall = (String, String);

#[derive(Clone)]
pub struct MockSearchClient {
    responses: Arc<Mutex<Vec<MockSearchResponse>>>,
    calls: Arc<Mutex<Vec<SearchCall>>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_facts(self, facts: Vec<EvidenceFact>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockSearchResponse::Facts(facts));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockSearchResponse::Failure(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSearchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReverseImageSearchService for MockSearchClient {
    async fn search(&self, image_url: &str, api_key: &str) -> Result<Vec<EvidenceFact>> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((image_url.to_string(), api_key.to_string()));
            calls.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(vec![EvidenceFact::NoResults]);
        }

        match &responses[(count - 1) % responses.len()] {
            MockSearchResponse::Facts(facts) => Ok(facts.clone()),
            MockSearchResponse::Failure(message) => Err(Error::Search(message.clone())),
        }
    }
}

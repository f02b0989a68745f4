use super::VisualAnalysisService;
use crate::models::LocationAnalysis;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockVisionResponse {
    Analysis(LocationAnalysis),
    Status(u16, String),
    Unparseable(String),
    Unreachable(String),
}

/// One recorded `analyze` call.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionCall {
    pub image_len: usize,
    pub context: Option<String>,
    pub location_guess: Option<String>,
}

#[derive(Clone)]
pub struct MockVisionClient {
    responses: Arc<Mutex<Vec<MockVisionResponse>>>,
    calls: Arc<Mutex<Vec<VisionCall>>>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(self, response: MockVisionResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_analysis(self, analysis: LocationAnalysis) -> Self {
        self.push(MockVisionResponse::Analysis(analysis))
    }

    /// Answer with a non-success HTTP status.
    pub fn with_status_error(self, status: u16, body: &str) -> Self {
        self.push(MockVisionResponse::Status(status, body.to_string()))
    }

    /// Answer with model text that is not valid JSON.
    pub fn with_unparseable(self, raw: &str) -> Self {
        self.push(MockVisionResponse::Unparseable(raw.to_string()))
    }

    pub fn with_unreachable(self, message: &str) -> Self {
        self.push(MockVisionResponse::Unreachable(message.to_string()))
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<VisionCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisualAnalysisService for MockVisionClient {
    async fn analyze(
        &self,
        image: &[u8],
        context: Option<&str>,
        location_guess: Option<&str>,
    ) -> Result<LocationAnalysis> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(VisionCall {
                image_len: image.len(),
                context: context.map(str::to_string),
                location_guess: location_guess.map(str::to_string),
            });
            calls.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(LocationAnalysis::default());
        }

        match &responses[(count - 1) % responses.len()] {
            MockVisionResponse::Analysis(analysis) => Ok(analysis.clone()),
            MockVisionResponse::Status(status, body) => Err(Error::AnalysisStatus {
                status: *status,
                body: body.clone(),
            }),
            MockVisionResponse::Unparseable(raw) => Err(Error::AnalysisParse {
                raw: raw.clone(),
                reason: "expected value at line 1 column 1".to_string(),
            }),
            MockVisionResponse::Unreachable(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_vision_records_calls() {
        let client = MockVisionClient::new();
        let analysis = client
            .analyze(&[1, 2, 3], Some("ctx"), None)
            .await
            .unwrap();

        assert!(analysis.locations.is_empty());
        assert_eq!(
            client.get_calls(),
            vec![VisionCall {
                image_len: 3,
                context: Some("ctx".to_string()),
                location_guess: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_vision_cycles_responses() {
        let client = MockVisionClient::new()
            .with_status_error(500, "boom")
            .with_unparseable("nope");

        assert!(matches!(
            client.analyze(&[], None, None).await,
            Err(Error::AnalysisStatus { status: 500, .. })
        ));
        assert!(matches!(
            client.analyze(&[], None, None).await,
            Err(Error::AnalysisParse { .. })
        ));
        assert!(matches!(
            client.analyze(&[], None, None).await,
            Err(Error::AnalysisStatus { .. })
        ));
        assert_eq!(client.get_call_count(), 3);
    }
}

use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::mime::detect_image_mime;
use crate::ai::response::parse_location_analysis;
use crate::ai::VisualAnalysisService;
use crate::models::LocationAnalysis;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Geolocation through Gemini's multimodal `generateContent`.
pub struct GeminiVisionClient {
    http: GeminiHttpClient,
}

impl GeminiVisionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, ANALYSIS_TIMEOUT, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(
        image: &[u8],
        context: Option<&str>,
        location_guess: Option<&str>,
    ) -> GenerateContentRequest {
        use base64::Engine as _;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: prompts::geolocation_prompt(context, location_guess),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: detect_image_mime(image).to_string(),
                            data: base64_image,
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: 0.4,
                top_k: 32,
                top_p: 1.0,
                max_output_tokens: 2048,
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl VisualAnalysisService for GeminiVisionClient {
    async fn analyze(
        &self,
        image: &[u8],
        context: Option<&str>,
        location_guess: Option<&str>,
    ) -> Result<LocationAnalysis> {
        tracing::debug!(
            "Analyzing image ({} bytes) with {}",
            image.len(),
            self.http.model()
        );

        let request = Self::build_request(image, context, location_guess);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let text = response.first_text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            Error::AiProvider(format!("No text in Gemini response ({})", reason))
        })?;

        let analysis = parse_location_analysis(&text).map_err(|e| {
            tracing::warn!("Gemini answer was not valid location JSON: {}", e);
            e
        })?;

        tracing::info!(
            "Gemini proposed {} candidate location(s)",
            analysis.locations.len()
        );

        Ok(analysis)
    }
}

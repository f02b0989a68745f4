//! Data models and structures
//!
//! Defines the evidence summaries, location candidates and the aggregated
//! analysis response, plus environment configuration.

use crate::credentials::Credentials;
use crate::host::PublicEndpoint;
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite-001";

/// Upper bound on candidates carried in an [`AnalysisResult`].
pub const MAX_LOCATIONS: usize = 3;

/// Decimal GPS position recovered from EXIF, with a map link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "google_maps_url")]
    pub maps_url: String,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            maps_url: format!("https://www.google.com/maps?q={},{}", latitude, longitude),
        }
    }
}

/// Structured view of an image's embedded metadata.
///
/// `Default` is the "no metadata" summary: every flag false, every field empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifSummary {
    pub has_exif: bool,
    pub has_gps: bool,
    pub gps_coordinates: Option<GpsCoordinates>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub datetime: Option<String>,
    pub software: Option<String>,
    pub orientation: Option<String>,
    pub all_tags: BTreeMap<String, String>,
}

/// Reverse-image-search evidence as carried in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvidence {
    pub context: Option<String>,
    pub has_results: bool,
}

impl SearchEvidence {
    pub fn from_context(context: Option<String>) -> Self {
        Self {
            has_results: context.is_some(),
            context,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive match; anything unrecognized is `Medium`.
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(Confidence::parse_lenient)
            .unwrap_or_default())
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// Model answers sometimes carry `null` or a bare number for a text field.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: String,
}

/// Successful visual-analysis answer, after shape normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub interpretation: String,
    #[serde(default)]
    pub locations: Vec<LocationCandidate>,
}

/// Full response of one `locate` request.
///
/// When `error` is set, `interpretation` and `locations` carry nothing; the
/// attached `exif_data` and `serpapi_results` remain valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    /// Present (possibly empty) on success, absent on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationCandidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif_data: Option<ExifSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi_results: Option<SearchEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "rawResponse", skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl AnalysisResult {
    pub fn from_analysis(analysis: LocationAnalysis) -> Self {
        Self {
            interpretation: Some(analysis.interpretation),
            locations: Some(analysis.locations),
            ..Self::default()
        }
    }

    /// Candidate locations; empty when the analysis failed.
    pub fn candidates(&self) -> &[LocationCandidate] {
        self.locations.as_deref().unwrap_or_default()
    }

    /// Map a visual-analysis failure onto the error fragment fields.
    pub fn from_error(error: &Error) -> Self {
        let mut result = Self::default();
        match error {
            Error::ImageLoad(reason) => {
                result.error = Some(format!("Failed to process image: {}", reason));
            }
            Error::AnalysisStatus { body, .. } => {
                result.error = Some("Failed to get response from Gemini API".to_string());
                result.details = Some(body.clone());
            }
            Error::AnalysisParse { raw, reason } => {
                result.error = Some("Failed to parse API response".to_string());
                result.raw_response = Some(raw.clone());
                result.exception = Some(reason.clone());
            }
            other => {
                result.error = Some("Failed to communicate with Gemini API".to_string());
                result.exception = Some(other.to_string());
            }
        }
        result
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub gemini_model: String,
    pub public_endpoint: Option<PublicEndpoint>,
    pub uploads_dir: Option<PathBuf>,
    pub use_imgur: bool,
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            public_endpoint: None,
            uploads_dir: None,
            use_imgur: false,
        }
    }

    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let http_port = match env_non_empty("GEOINTEL_HTTP_PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("GEOINTEL_HTTP_PORT '{}' is not a port: {}", raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            credentials: Credentials::from_env(),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            public_endpoint: env_non_empty("GEOINTEL_PUBLIC_BASE_URL")
                .map(|base| PublicEndpoint::new(base, http_port)),
            uploads_dir: env_non_empty("GEOINTEL_UPLOADS_DIR").map(PathBuf::from),
            use_imgur: env_non_empty("GEOINTEL_USE_IMGUR")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Reject configurations that cannot run any analysis at all.
    pub fn validate(&self) -> crate::Result<()> {
        if self.credentials.gemini_key.is_none() {
            return Err(Error::Config(
                "Gemini API key not configured (set GEMINI_API_KEY)".to_string(),
            ));
        }
        if self.use_imgur && self.credentials.imgur_client_id.is_none() {
            return Err(Error::Config(
                "Imgur hosting requested but IMGUR_CLIENT_ID is not set".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

//! Request orchestration: metadata, reverse image search and visual analysis
//! merged into one [`AnalysisResult`].

use crate::ai::{GeminiVisionClient, VisualAnalysisService};
use crate::credentials::{mask_secret, sanitize_credential};
use crate::host::{ImageHost, ImgurImageHost, StaticImageHost};
use crate::metadata;
use crate::models::{AnalysisResult, Config, ExifSummary, LocationAnalysis, SearchEvidence};
use crate::search::{render_evidence, ReverseImageSearchService, SerpApiClient};
use crate::source::ImageSource;
use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// One geolocation request.
#[derive(Clone)]
pub struct LocateRequest {
    pub image: ImageSource,
    pub context_info: Option<String>,
    pub location_guess: Option<String>,
    /// Per-request SerpAPI key; wins over the configured one.
    pub search_key: Option<String>,
}

impl LocateRequest {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            context_info: None,
            location_guess: None,
            search_key: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_info = Some(context.into());
        self
    }

    pub fn with_location_guess(mut self, guess: impl Into<String>) -> Self {
        self.location_guess = Some(guess.into());
        self
    }

    pub fn with_search_key(mut self, key: impl Into<String>) -> Self {
        self.search_key = Some(key.into());
        self
    }
}

impl fmt::Debug for LocateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocateRequest")
            .field("image", &self.image)
            .field("context_info", &self.context_info)
            .field("location_guess", &self.location_guess)
            .field("search_key", &self.search_key.as_deref().map(mask_secret))
            .finish()
    }
}

/// Geolocation pipeline shared by all requests.
pub struct GeoIntel {
    vision: Box<dyn VisualAnalysisService>,
    search: Box<dyn ReverseImageSearchService>,
    host: Option<Box<dyn ImageHost>>,
    http: reqwest::Client,
    search_key: Option<String>,
}

/// Injectable service bundle used to construct [`GeoIntel`] in tests/harnesses.
pub struct AppServices {
    pub vision: Box<dyn VisualAnalysisService>,
    pub search: Box<dyn ReverseImageSearchService>,
    /// Publishes local files for reverse search. Without one, local images
    /// are analyzed but not searched.
    pub host: Option<Box<dyn ImageHost>>,
    /// Used to download remote images.
    pub http: reqwest::Client,
}

impl GeoIntel {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            vision: services.vision,
            search: services.search,
            host: services.host,
            http: services.http,
            search_key: None,
        }
    }

    /// Default SerpAPI key for requests that do not bring their own.
    pub fn with_search_key(mut self, key: Option<String>) -> Self {
        self.search_key = key
            .map(|k| sanitize_credential(&k))
            .filter(|k| !k.is_empty());
        self
    }

    /// Construct the production pipeline. Fails before any client exists
    /// when the configuration cannot run an analysis.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let gemini_key = config.credentials.gemini_key.clone().ok_or_else(|| {
            Error::Config("Gemini API key not configured (set GEMINI_API_KEY)".to_string())
        })?;

        // Reuse one HTTP connection pool across provider clients.
        let http = reqwest::Client::new();

        info!("Vision provider: Gemini (model: {})", config.gemini_model);
        let vision = Box::new(GeminiVisionClient::new_with_client(
            gemini_key,
            config.gemini_model.clone(),
            http.clone(),
        ));
        let search = Box::new(SerpApiClient::new_with_client(http.clone()));

        let host: Option<Box<dyn ImageHost>> = if config.use_imgur {
            let client_id = config.credentials.imgur_client_id.clone().ok_or_else(|| {
                Error::Config("Imgur hosting requested but IMGUR_CLIENT_ID is not set".to_string())
            })?;
            info!("Image host: Imgur");
            Some(Box::new(ImgurImageHost::new_with_client(
                client_id,
                http.clone(),
            )))
        } else if let Some(endpoint) = &config.public_endpoint {
            info!("Image host: static files at {}", endpoint.url_for(""));
            Some(Box::new(StaticImageHost::new_with_client(
                endpoint.clone(),
                http.clone(),
            )))
        } else {
            info!("No public image host configured; local images will not be reverse-searched");
            None
        };

        Ok(Self::with_services(AppServices {
            vision,
            search,
            host,
            http,
        })
        .with_search_key(config.credentials.serpapi_key.clone()))
    }

    /// Run the full pipeline for one image. Never fails: analysis errors are
    /// reported as error fields next to whatever evidence was gathered.
    pub async fn locate(&self, request: &LocateRequest) -> AnalysisResult {
        info!("Locating {}", request.image);

        let exif = match request.image.local_path() {
            Some(path) => Some(self.read_exif(path).await),
            None => None,
        };

        let search = match self.effective_search_key(request) {
            Some(key) => Some(self.search_evidence(&request.image, &key).await),
            None => {
                debug!("No search key; skipping reverse image search");
                None
            }
        };

        let context = combined_context(
            request.context_info.as_deref(),
            search.as_ref(),
            exif.as_ref(),
        );

        let mut result = match self
            .analyze(
                &request.image,
                context.as_deref(),
                request.location_guess.as_deref(),
            )
            .await
        {
            Ok(analysis) => {
                info!(
                    "Analysis complete with {} candidate location(s)",
                    analysis.locations.len()
                );
                AnalysisResult::from_analysis(analysis)
            }
            Err(e) => {
                error!("Visual analysis failed: {}", e);
                AnalysisResult::from_error(&e)
            }
        };

        result.exif_data = exif;
        result.serpapi_results = search;
        result
    }

    fn effective_search_key(&self, request: &LocateRequest) -> Option<String> {
        request
            .search_key
            .as_deref()
            .map(sanitize_credential)
            .filter(|k| !k.is_empty())
            .or_else(|| self.search_key.clone())
    }

    async fn read_exif(&self, path: &Path) -> ExifSummary {
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || metadata::extract_exif_summary(&path)).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("EXIF extraction task failed: {}", e);
                ExifSummary::default()
            }
        }
    }

    async fn search_url(&self, image: &ImageSource) -> Result<String> {
        match image {
            ImageSource::Remote(url) => Ok(url.clone()),
            ImageSource::Local(path) => match &self.host {
                Some(host) => host.public_url(path).await,
                None => Err(Error::ImageHost(
                    "no public image host configured for local files".to_string(),
                )),
            },
        }
    }

    async fn search_evidence(&self, image: &ImageSource, key: &str) -> SearchEvidence {
        debug!("Reverse image search with key {}", mask_secret(key));

        let url = match self.search_url(image).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping reverse image search: {}", e);
                return SearchEvidence::from_context(None);
            }
        };

        match self.search.search(&url, key).await {
            Ok(facts) => SearchEvidence::from_context(render_evidence(&facts)),
            Err(e) => {
                warn!("Reverse image search failed: {}", e);
                SearchEvidence::from_context(None)
            }
        }
    }

    async fn analyze(
        &self,
        image: &ImageSource,
        context: Option<&str>,
        location_guess: Option<&str>,
    ) -> Result<LocationAnalysis> {
        let bytes = image.load(&self.http).await?;
        debug!("Loaded {} bytes from {}", bytes.len(), image);
        self.vision.analyze(&bytes, context, location_guess).await
    }
}

/// Context handed to the vision model: user text, search evidence and EXIF
/// GPS, separated by blank lines. Blank sections are left out.
pub fn combined_context(
    user_context: Option<&str>,
    search: Option<&SearchEvidence>,
    exif: Option<&ExifSummary>,
) -> Option<String> {
    let mut sections = Vec::new();

    if let Some(text) = user_context.map(str::trim).filter(|t| !t.is_empty()) {
        sections.push(text.to_string());
    }
    if let Some(evidence) = search
        .and_then(|s| s.context.as_deref())
        .filter(|c| !c.trim().is_empty())
    {
        sections.push(format!("Google Search Context:\n{}", evidence));
    }
    if let Some(gps) = exif.and_then(|e| e.gps_coordinates.as_ref()) {
        sections.push(format!(
            "EXIF GPS Data: Lat {}, Lon {}",
            gps.latitude, gps.longitude
        ));
    }

    (!sections.is_empty()).then(|| sections.join("\n\n"))
}

//! Visual location analysis
//!
//! A vision model looks at the image bytes plus optional user context and
//! proposes up to three candidate locations.

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod response;

pub use gemini::GeminiVisionClient;
pub use mock::MockVisionClient;

use crate::models::LocationAnalysis;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait VisualAnalysisService: Send + Sync {
    /// Analyze raw image bytes. `context` is the combined context text built
    /// by the caller; `location_guess` is the user's hint, if any.
    async fn analyze(
        &self,
        image: &[u8],
        context: Option<&str>,
        location_guess: Option<&str>,
    ) -> Result<LocationAnalysis>;
}

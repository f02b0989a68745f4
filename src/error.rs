//! Error handling and custom error types
//!
//! Provides unified error handling across the pipeline using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("Image host error: {0}")]
    ImageHost(String),

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    /// The analysis endpoint answered with a non-success status.
    #[error("Analysis API error (status {status}): {body}")]
    AnalysisStatus { status: u16, body: String },

    /// The model answered, but not with parseable JSON.
    #[error("Failed to parse analysis response: {reason}")]
    AnalysisParse { raw: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

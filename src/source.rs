//! Image references: local files or remote http(s) URLs.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Remote(String),
}

impl ImageSource {
    /// `http://` and `https://` references are remote, everything else is a path.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            ImageSource::Remote(trimmed.to_string())
        } else {
            ImageSource::Local(PathBuf::from(trimmed))
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            ImageSource::Local(path) => Some(path.as_path()),
            ImageSource::Remote(_) => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageSource::Remote(_))
    }

    /// Read the image bytes from disk, or download them.
    pub async fn load(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            ImageSource::Local(path) => tokio::fs::read(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ImageLoad(format!("Image file not found: {}", path.display()))
                } else {
                    Error::ImageLoad(format!("Failed to read image file: {}", e))
                }
            }),
            ImageSource::Remote(url) => {
                tracing::debug!("Downloading image from {}", url);
                let response = client
                    .get(url)
                    .timeout(DOWNLOAD_TIMEOUT)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| {
                        Error::ImageLoad(format!("Failed to download image from {}: {}", url, e))
                    })?;

                let bytes = response.bytes().await.map_err(|e| {
                    Error::ImageLoad(format!("Failed to download image from {}: {}", url, e))
                })?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl From<&str> for ImageSource {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Local(path) => write!(f, "{}", path.display()),
            ImageSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

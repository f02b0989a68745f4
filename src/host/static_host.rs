use super::ImageHost;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Externally reachable address of the static file server.
///
/// `base_url` may omit the scheme (`http` is assumed) and may carry a path
/// prefix; `port` is inserted into the authority unless it already has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicEndpoint {
    pub base_url: String,
    pub port: Option<u16>,
}

impl PublicEndpoint {
    pub fn new(base_url: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            base_url: base_url.into(),
            port,
        }
    }

    /// Public URL of `filename`; the name is percent-encoded as one path segment.
    pub fn url_for(&self, filename: &str) -> String {
        let base = self.base_with_port();
        match Url::parse(&base) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push(filename);
                }
                url.to_string()
            }
            Err(e) => {
                tracing::warn!("Public base URL {} is not a valid URL: {}", base, e);
                format!("{}/{}", base, filename)
            }
        }
    }

    fn base_with_port(&self) -> String {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let (scheme, rest) = trimmed.split_once("://").unwrap_or(("http", trimmed));
        let (authority, prefix) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        // IPv6 literals carry colons inside the brackets.
        let host_end = authority.rfind(']').map(|idx| idx + 1).unwrap_or(0);
        let has_port = authority[host_end..].contains(':');

        let authority = match self.port {
            Some(port) if !has_port => format!("{}:{}", authority, port),
            _ => authority.to_string(),
        };

        format!("{}://{}{}", scheme, authority, prefix)
    }
}

/// Static file server that exposes `<public-base>/<filename>`.
pub struct StaticImageHost {
    client: Client,
    endpoint: PublicEndpoint,
}

impl StaticImageHost {
    pub fn new(endpoint: PublicEndpoint) -> Self {
        Self::new_with_client(endpoint, Client::new())
    }

    pub fn new_with_client(endpoint: PublicEndpoint, client: Client) -> Self {
        Self { client, endpoint }
    }

    /// Best-effort liveness check; failures are only logged.
    async fn probe(&self, url: &str) {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Image is accessible at {}", url);
            }
            Ok(response) => {
                tracing::warn!(
                    "Image may not be accessible at {} (status: {})",
                    url,
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Could not verify image accessibility at {}: {}", url, e);
            }
        }
    }
}

#[async_trait]
impl ImageHost for StaticImageHost {
    async fn public_url(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::ImageHost(format!("No usable file name in {}", path.display()))
            })?;

        let url = self.endpoint.url_for(filename);
        tracing::info!("Using public URL for reverse image search: {}", url);
        self.probe(&url).await;
        Ok(url)
    }
}

/// Copy `source` into `uploads_dir` under a collision-resistant name.
///
/// The original extension is kept (`.jpg` when missing). Empty files are
/// rejected and not left behind.
pub async fn stage_upload(uploads_dir: &Path, source: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(uploads_dir).await?;

    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or("jpg");
    let token = Uuid::new_v4().simple().to_string();
    let destination = uploads_dir.join(format!("{}.{}", &token[..16], extension));

    let written = tokio::fs::copy(source, &destination).await?;
    if written == 0 {
        tokio::fs::remove_file(&destination).await.ok();
        return Err(Error::ImageHost(format!(
            "Uploaded file is empty: {}",
            source.display()
        )));
    }

    tracing::info!("Staged {} as {}", source.display(), destination.display());
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_for_bare_host_and_port() {
        let endpoint = PublicEndpoint::new("203.0.113.7", Some(1339));
        assert_eq!(
            endpoint.url_for("photo.jpg"),
            "http://203.0.113.7:1339/photo.jpg"
        );
    }

    #[test]
    fn test_url_for_keeps_scheme_and_path_prefix() {
        let endpoint = PublicEndpoint::new("https://img.example.com/uploads/", Some(8443));
        assert_eq!(
            endpoint.url_for("a.png"),
            "https://img.example.com:8443/uploads/a.png"
        );
    }

    #[test]
    fn test_url_for_without_port_or_with_explicit_port() {
        assert_eq!(
            PublicEndpoint::new("https://img.example.com", None).url_for("a.png"),
            "https://img.example.com/a.png"
        );
        assert_eq!(
            PublicEndpoint::new("http://host:2001", Some(1339)).url_for("a.png"),
            "http://host:2001/a.png"
        );
    }

    #[test]
    fn test_url_for_percent_encodes_file_name() {
        let endpoint = PublicEndpoint::new("203.0.113.7", Some(1339));
        assert_eq!(
            endpoint.url_for("my photo#1.jpg"),
            "http://203.0.113.7:1339/my%20photo%231.jpg"
        );
    }

    #[test]
    fn test_url_for_ipv6_authority() {
        assert_eq!(
            PublicEndpoint::new("[2001:db8::7]", Some(1339)).url_for("a.png"),
            "http://[2001:db8::7]:1339/a.png"
        );
        assert_eq!(
            PublicEndpoint::new("http://[2001:db8::7]:8080", Some(1339)).url_for("a.png"),
            "http://[2001:db8::7]:8080/a.png"
        );
    }

    #[tokio::test]
    async fn test_public_url_uses_base_name_and_probes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/photo.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let host = StaticImageHost::new(PublicEndpoint::new(server.uri(), None));
        let url = host
            .public_url(Path::new("/var/uploads/photo.jpg"))
            .await
            .unwrap();

        assert_eq!(url, format!("{}/photo.jpg", server.uri()));
    }

    #[tokio::test]
    async fn test_failed_probe_is_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let host = StaticImageHost::new(PublicEndpoint::new(server.uri(), None));
        let url = host.public_url(Path::new("gone.jpg")).await.unwrap();
        assert!(url.ends_with("/gone.jpg"));
    }

    #[tokio::test]
    async fn test_stage_upload_copies_with_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("original.png");
        std::fs::write(&source, b"png-bytes").unwrap();
        let uploads = dir.path().join("uploads");

        let first = stage_upload(&uploads, &source).await.unwrap();
        let second = stage_upload(&uploads, &source).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&first).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_stage_upload_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty");
        std::fs::write(&source, b"").unwrap();
        let uploads = dir.path().join("uploads");

        let err = stage_upload(&uploads, &source).await.unwrap_err();
        assert!(matches!(err, Error::ImageHost(_)));
        assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
    }
}

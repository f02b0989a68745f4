use super::ImageHost;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_UPLOAD_URL: &str = "https://api.imgur.com/3/image";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    link: Option<String>,
}

/// Publishes local images by uploading them to Imgur.
pub struct ImgurImageHost {
    client: Client,
    client_id: String,
    upload_url: String,
    timeout: Duration,
}

impl ImgurImageHost {
    pub fn new(client_id: String) -> Self {
        Self::new_with_client(client_id, Client::new())
    }

    pub fn new_with_client(client_id: String, client: Client) -> Self {
        Self {
            client,
            client_id,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_upload_url(mut self, upload_url: String) -> Self {
        self.upload_url = upload_url;
        self
    }
}

#[async_trait]
impl ImageHost for ImgurImageHost {
    async fn public_url(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.upload_url)
            .timeout(self.timeout)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Imgur upload failed (status {}): {}", status, error_text);
            return Err(Error::ImageHost(format!(
                "Imgur upload failed (status {}): {}",
                status, error_text
            )));
        }

        let body: UploadResponse = response.json().await?;
        let link = body
            .data
            .and_then(|data| data.link)
            .ok_or_else(|| Error::ImageHost("Imgur response carried no link".to_string()))?;

        tracing::info!("Uploaded {} to {}", path.display(), link);
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn image_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let file = dir.path().join("shot.jpg");
        tokio::fs::write(&file, [0xFF, 0xD8, 0xFF]).await.unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_returns_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/image"))
            .and(header("Authorization", "Client-ID abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "link": "https://i.imgur.com/xyz.jpg" },
                "success": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let host = ImgurImageHost::new("abc123".to_string())
            .with_upload_url(format!("{}/3/image", server.uri()));

        let url = host.public_url(&image_file(&dir).await).await.unwrap();
        assert_eq!(url, "https://i.imgur.com/xyz.jpg");
    }

    #[tokio::test]
    async fn test_upload_without_link_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let host = ImgurImageHost::new("abc123".to_string()).with_upload_url(server.uri());

        let err = host.public_url(&image_file(&dir).await).await.unwrap_err();
        assert!(matches!(err, Error::ImageHost(_)));
    }

    #[tokio::test]
    async fn test_upload_rejected_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad client id"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let host = ImgurImageHost::new("wrong".to_string()).with_upload_url(server.uri());

        let err = host.public_url(&image_file(&dir).await).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}

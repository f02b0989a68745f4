use super::ImageHost;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockImageHost {
    base_url: String,
    published: Arc<Mutex<Vec<PathBuf>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-host.example.com".to_string(),
            published: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_published(&self) -> Vec<PathBuf> {
        self.published.lock().unwrap().clone()
    }
}

impl Default for MockImageHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn public_url(&self, path: &Path) -> Result<String> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::ImageHost("Mock failure".to_string()));
        }

        self.published.lock().unwrap().push(path.to_path_buf());
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(format!("{}/{}", self.base_url, filename))
    }
}

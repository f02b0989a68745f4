//! Public image hosting
//!
//! The reverse-image-search provider fetches the image itself, so a local
//! file must first be reachable at a public URL. Hosts are explicitly
//! constructed and injected into the aggregator.

pub mod imgur;
pub mod mock;
pub mod static_host;

pub use imgur::ImgurImageHost;
pub use mock::MockImageHost;
pub use static_host::{stage_upload, PublicEndpoint, StaticImageHost};

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Publicly reachable URL for a local image file.
    async fn public_url(&self, path: &Path) -> Result<String>;
}

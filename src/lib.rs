//! GeoIntel - best-effort image geolocation
//!
//! Combines embedded EXIF metadata, a reverse-image web search and a
//! multimodal AI visual analysis into a ranked list of candidate locations.

pub mod ai;
pub mod app;
pub mod credentials;
pub mod error;
pub mod host;
pub mod metadata;
pub mod models;
pub mod prompts;
pub mod search;
pub mod source;

pub use error::{Error, Result};

//! Image preloading.
//!
//! Every image the rendered document references is fetched before capture,
//! concurrently, each under its own timeout. A failure or timeout is logged
//! and the image is left out of the [`AssetMap`]; it never fails the export.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::raster::AssetMap;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Source of image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, AssetError>;
}

/// Fetches `http(s)://` URLs, `data:` URLs and local file paths.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("proforma/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssetError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Decode the payload of a base64 `data:` URL.
fn decode_data_url(source: &str) -> Result<Vec<u8>, AssetError> {
    let (meta, payload) = source
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| AssetError::Fetch("malformed data URL".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(AssetError::Fetch("only base64 data URLs are supported".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AssetError::Decode(format!("bad base64 payload: {}", e)))
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, AssetError> {
        if source.starts_with("data:") {
            return decode_data_url(source);
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .map_err(|e| AssetError::Fetch(format!("Failed to download {}: {}", source, e)))?;
            if !response.status().is_success() {
                return Err(AssetError::Fetch(format!(
                    "Failed to download {}: HTTP {}",
                    source,
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| AssetError::Fetch(format!("Failed to read image data: {}", e)))?;
            return Ok(bytes.to_vec());
        }

        let path = source.strip_prefix("file://").unwrap_or(source);
        tokio::fs::read(path)
            .await
            .map_err(|e| AssetError::Fetch(format!("Failed to read {}: {}", path, e)))
    }
}

async fn load_one(fetcher: Arc<dyn ImageFetcher>, source: String) -> Result<RgbaImage, AssetError> {
    let bytes = fetcher.fetch(&source).await?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| AssetError::Decode(format!("Failed to decode image: {}", e)))?;
    Ok(image.to_rgba8())
}

/// Fetch and decode `sources` concurrently. Returns whatever loaded.
pub async fn preload_images(
    fetcher: Arc<dyn ImageFetcher>,
    sources: &[String],
    timeout: Duration,
) -> AssetMap {
    let mut tasks = JoinSet::new();
    for source in sources {
        let fetcher = Arc::clone(&fetcher);
        let source = source.clone();
        tasks.spawn(async move {
            let result = tokio::time::timeout(timeout, load_one(fetcher, source.clone())).await;
            (source, result)
        });
    }

    let mut assets = AssetMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source, Ok(Ok(image)))) => {
                tracing::debug!(source = %source, width = image.width(), height = image.height(), "image preloaded");
                assets.insert(source, Arc::new(image));
            }
            Ok((source, Ok(Err(e)))) => {
                tracing::warn!(source = %source, error = %e, "image preload failed, rendering without it");
            }
            Ok((source, Err(_))) => {
                tracing::warn!(source = %source, timeout_secs = timeout.as_secs_f64(), "image preload timed out, rendering without it");
            }
            Err(e) => {
                tracing::warn!(error = %e, "image preload task failed");
            }
        }
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::encode_png;
    use image::Rgba;
    use std::collections::HashMap;

    /// Serves canned responses; unknown sources fail, `slow:` sources hang.
    struct FakeFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, source: &str) -> Result<Vec<u8>, AssetError> {
            if source.starts_with("slow:") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.responses
                .get(source)
                .cloned()
                .ok_or_else(|| AssetError::Fetch(format!("404 {}", source)))
        }
    }

    fn png() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))).unwrap()
    }

    #[tokio::test]
    async fn broken_and_slow_images_are_skipped() {
        let mut responses = HashMap::new();
        responses.insert("ok".to_string(), png());
        responses.insert("garbage".to_string(), b"not an image".to_vec());
        let fetcher: Arc<dyn ImageFetcher> = Arc::new(FakeFetcher { responses });

        let sources = vec![
            "ok".to_string(),
            "missing".to_string(),
            "garbage".to_string(),
            "slow:forever".to_string(),
        ];
        let assets = preload_images(fetcher, &sources, Duration::from_millis(50)).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets["ok"].dimensions(), (3, 2));
    }

    #[tokio::test]
    async fn data_urls_decode() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png()));
        let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new().unwrap());
        let assets = preload_images(fetcher, &[url.clone()], Duration::from_secs(5)).await;
        assert!(assets.contains_key(&url));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let fetcher = HttpImageFetcher::new().unwrap();
        assert!(matches!(
            fetcher.fetch("/definitely/not/here.png").await,
            Err(AssetError::Fetch(_))
        ));
    }

    #[test]
    fn data_url_without_base64_is_rejected() {
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("data:nocomma").is_err());
    }
}

use crate::config::OcrConfig;
use crate::error::ExtractError;
use crate::providers::{read_json, resolve_api_key};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

const PROVIDER: &str = "google-vision";

/// Represents the source of an image for OCR processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Image from a file path
    Path(PathBuf),
    /// Image as base64-encoded data
    Base64(String),
    /// Image as a `data:image/...;base64,...` URL
    DataUrl(String),
}

impl ImageSource {
    /// Base64 payload of the image, reading the file if needed
    pub async fn to_base64(&self) -> Result<String, ExtractError> {
        match self {
            ImageSource::Path(path) => {
                let image_data = tokio::fs::read(path).await?;
                Ok(STANDARD.encode(&image_data))
            }
            ImageSource::Base64(data) => Ok(data.trim().to_string()),
            ImageSource::DataUrl(url) => {
                let (header, data) = url.split_once(',').ok_or_else(|| {
                    ExtractError::InvalidInput("data URL has no payload".to_string())
                })?;
                if !header.starts_with("data:") || !header.ends_with(";base64") {
                    return Err(ExtractError::InvalidInput(format!(
                        "unsupported data URL header: {header}"
                    )));
                }
                Ok(data.trim().to_string())
            }
        }
    }
}

/// An image-to-text collaborator
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Extract the raw text of one image
    async fn recognize(&self, image: &ImageSource) -> Result<String, ExtractError>;
}

/// Google Cloud Vision `TEXT_DETECTION`
pub struct GoogleVisionRecognizer {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleVisionRecognizer {
    /// Key from configuration, else `GOOGLE_API_KEY`. Fails before any request when
    /// no usable key is set.
    pub fn new(config: &OcrConfig, timeout: Duration) -> Result<Self, ExtractError> {
        let api_key = resolve_api_key(PROVIDER, config.api_key.as_deref(), "GOOGLE_API_KEY")?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://vision.googleapis.com".to_string());
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Calls the Google Cloud Vision API to perform OCR on base64-encoded image data
    async fn call_google_vision(&self, base64_image: &str) -> Result<String, ExtractError> {
        let url = format!("{}/v1/images:annotate", self.base_url);

        let request_body = json!({
            "requests": [{
                "image": {
                    "content": base64_image
                },
                "features": [{
                    "type": "TEXT_DETECTION"
                }]
            }]
        });

        debug!("Sending OCR request to Google Vision API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .header("Accept-Encoding", "identity")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        let response_body = read_json(PROVIDER, response).await?;

        if let Some(message) = response_body["responses"][0]["error"]["message"].as_str() {
            return Err(ExtractError::Api {
                provider: PROVIDER.to_string(),
                status: None,
                message: message.to_string(),
            });
        }

        // The API returns all detected text in the full annotation; a blank image has none
        let text = response_body["responses"][0]["fullTextAnnotation"]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        debug!("Extracted text from image: {} characters", text.len());

        Ok(text)
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    async fn recognize(&self, image: &ImageSource) -> Result<String, ExtractError> {
        let base64_image = image.to_base64().await?;
        if base64_image.is_empty() {
            return Err(ExtractError::InvalidInput("empty image".to_string()));
        }
        self.call_google_vision(&base64_image).await
    }
}

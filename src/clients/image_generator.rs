//! Cliente del servicio de generación de imágenes
//!
//! El generador se trata como una caja negra texto -> imagen. Hay dos
//! implementaciones: el cliente HTTP compatible con la API de imágenes de
//! OpenAI y un mock determinista para entornos sin credenciales.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::car::{CarCategory, CarUsage};

/// Resolución nativa del generador (vertical, ~9:16)
pub const IMAGE_SIZE: &str = "1024x1792";

const IMAGE_MODEL: &str = "dall-e-3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// PNG 1x1 que devuelve el mock
const MOCK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Errores del generador de imágenes
#[derive(Error, Debug)]
pub enum ImageGenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Image API response has no image data")]
    MissingData,

    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Descripción estructurada del coche a generar
#[derive(Debug, Clone, PartialEq)]
pub struct CarPrompt {
    pub maker: String,
    pub model: String,
    pub color: String,
    pub category: CarCategory,
    pub usage: Option<CarUsage>,
}

impl CarPrompt {
    /// "<maker> <model>, <color>[, <usage>]"
    pub fn car_description(&self) -> String {
        let mut description = format!("{} {}, {}", self.maker, self.model, self.color);
        if let Some(usage) = self.usage {
            description.push_str(", ");
            description.push_str(usage.display_name());
        }
        description
    }

    /// Prompt completo enviado al generador
    pub fn to_prompt(&self) -> String {
        format!(
            "A high quality, realistic photo of a {}.\n\
             The car is the main subject, centered, facing slightly towards the viewer (3/4 view).\n\
             Background should be simple and scenic (e.g. road, city, or nature) but not distracting.\n\
             Vertical aspect ratio.\n\
             NO text, NO watermarks, NO brand logos if possible (or minimal).\n\
             Photorealistic, 8k resolution, highly detailed.",
            self.car_description()
        )
    }
}

/// Generador de imágenes texto -> bytes de imagen
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError>;
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u8,
    size: &'a str,
    response_format: &'a str,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// Cliente de la API de imágenes de OpenAI
pub struct OpenAiImageGenerator {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiImageGenerator {
    pub fn new(api_key: String, base_url: String) -> Result<Self, ImageGenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        let prompt_text = prompt.to_prompt();
        log::info!("🎨 Generando imagen con prompt: {}", prompt_text);

        let request = ImageGenerationRequest {
            model: IMAGE_MODEL,
            prompt: prompt_text,
            n: 1,
            size: IMAGE_SIZE,
            response_format: "b64_json",
            quality: "standard",
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::info!("📡 Image API status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Generación de imagen falló con status {}: {}", status, body);
            return Err(ImageGenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageGenerationResponse = response.json().await?;
        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or(ImageGenerationError::MissingData)?;

        let bytes = BASE64.decode(b64.as_bytes())?;
        log::info!("✅ Imagen generada ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

/// Generador mock: siempre devuelve el mismo PNG 1x1
#[derive(Debug, Default, Clone)]
pub struct MockImageGenerator;

impl MockImageGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn placeholder_png() -> Vec<u8> {
        // Constante válida, el decode no puede fallar
        BASE64.decode(MOCK_PNG_BASE64).unwrap_or_default()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &CarPrompt) -> Result<Vec<u8>, ImageGenerationError> {
        log::warn!("🧪 Mock de imagen para: {}", prompt.car_description());
        Ok(Self::placeholder_png())
    }
}

//! Clients - HTTP Clients for External APIs
//!
//! This module contains the client for the text-to-image generation service.

pub mod image_generator;

// Re-export main types for convenience
pub use image_generator::{
    CarPrompt,
    ImageGenerationError,
    ImageGenerator,
    MockImageGenerator,
    OpenAiImageGenerator,
};

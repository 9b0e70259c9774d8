//! Shared application state
//! 
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::clients::{ImageGenerationError, ImageGenerator, MockImageGenerator, OpenAiImageGenerator};
use crate::config::environment::EnvironmentConfig;
use crate::controllers::CardController;
use crate::repositories::JsonFileCardStore;
use crate::services::card_compositor::CardCompositor;
use crate::services::CardService;

/// Errores al construir el estado en el arranque
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Car catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Image generator error: {0}")]
    ImageGenerator(#[from] ImageGenerationError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub card_service: CardService,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, card_service: CardService) -> Self {
        Self {
            config,
            card_service,
        }
    }

    /// Construir catálogo, store, generador y compositor desde la configuración
    pub fn from_config(config: EnvironmentConfig) -> Result<Self, StateError> {
        let catalog = match &config.car_catalog_path {
            Some(path) => {
                info!("📚 Cargando catálogo de coches desde {}", path.display());
                Catalog::from_json_file(path)?
            }
            None => Catalog::builtin()?,
        };
        info!("🚗 Catálogo con {} coches", catalog.len());

        let generator: Arc<dyn ImageGenerator> = match (&config.openai_api_key, config.use_mock_generator()) {
            (Some(key), false) => {
                info!("🎨 Generador de imágenes: OpenAI ({})", config.openai_base_url);
                Arc::new(OpenAiImageGenerator::new(key.clone(), config.openai_base_url.clone())?)
            }
            _ => {
                warn!("🎭 Generador de imágenes MOCK activo (imagen de relleno)");
                Arc::new(MockImageGenerator::new())
            }
        };

        let store = Arc::new(JsonFileCardStore::new(config.store_path()));
        let compositor = Arc::new(CardCompositor::new(config.card_font_dir.as_deref()));

        let card_service = CardService::new(
            Arc::new(catalog),
            store,
            generator,
            compositor,
            config.images_dir(),
        )
        .with_generation_timeout(config.generation_timeout);

        Ok(Self::new(config, card_service))
    }

    /// Controlador de cartas para una request
    pub fn card_controller(&self) -> CardController {
        CardController::new(self.card_service.clone(), self.config.images_url_prefix())
    }
}

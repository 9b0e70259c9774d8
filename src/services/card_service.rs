//! Coordinador de generación de cartas
//!
//! Generación idempotente por fecha:
//! - si la carta ya existe en el store se devuelve tal cual, sin trabajo extra
//! - si otra request del mismo proceso la está generando se responde
//!   `Generating` sin bloquear (el cliente vuelve a preguntar más tarde)
//! - si no, se toma el lock y se ejecuta selección -> imagen -> composición
//!   -> guardado del PNG -> upsert del registro
//!
//! El lock es local al proceso. Sin `generation_timeout` un generador colgado
//! retiene el lock de su fecha hasta reiniciar el proceso.
//!
//! Con timeout, al expirar se descarta el future de la generación y se libera
//! el lock, así que ningún paso posterior llega a ejecutarse. Lo que ya
//! estaba corriendo en el pool bloqueante termina igualmente:
//! - una composición huérfana produce bytes que nadie recoge
//! - una escritura del PNG en curso acaba en `<fecha>.png.tmp`; el rename es
//!   un paso aparte, así que el PNG final nunca queda a medias
//! - si el rename del PNG o del store ya estaba lanzado, se completa: el
//!   registro apunta a una imagen completa y un reintento lo encuentra
//!
//! Un reintento concurrente con ese último rename puede sobrescribir el PNG
//! con otro coche; la ventana es la de ese rename.

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::clients::{CarPrompt, ImageGenerationError, ImageGenerator};
use crate::models::card::{CardMap, CardRecord};
use crate::repositories::{CardStore, StoreError};
use crate::services::car_selector::{select_car_for_date, Selection};
use crate::services::card_compositor::{CardCompositor, CompositorError};
use crate::services::generation_lock::GenerationLocks;

/// Errores de la generación de una carta
#[derive(Error, Debug)]
pub enum CardServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Image generation failed: {0}")]
    ImageGeneration(#[from] ImageGenerationError),

    #[error("Compositing failed: {0}")]
    Compositor(#[from] CompositorError),

    #[error("Failed to write card image {}: {source}", .path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compositing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Generation for {0} timed out")]
    TimedOut(NaiveDate),
}

/// Resultado de pedir la carta de una fecha
#[derive(Debug, Clone, PartialEq)]
pub enum CardOutcome {
    Ready(CardRecord),
    Generating,
}

#[derive(Clone)]
pub struct CardService {
    catalog: Arc<Catalog>,
    store: Arc<dyn CardStore>,
    generator: Arc<dyn ImageGenerator>,
    compositor: Arc<CardCompositor>,
    locks: GenerationLocks,
    rng: Arc<Mutex<StdRng>>,
    images_dir: PathBuf,
    generation_timeout: Option<Duration>,
}

impl CardService {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn CardStore>,
        generator: Arc<dyn ImageGenerator>,
        compositor: Arc<CardCompositor>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            store,
            generator,
            compositor,
            locks: GenerationLocks::new(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            images_dir: images_dir.into(),
            generation_timeout: None,
        }
    }

    /// Semilla fija para la selección (tests reproducibles)
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    /// Límite de tiempo por generación. Al expirar se libera el lock y se
    /// devuelve `TimedOut`, que el cliente puede reintentar.
    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn locks(&self) -> &GenerationLocks {
        &self.locks
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Ruta del PNG de una fecha: `<images_dir>/<YYYY-MM-DD>.png`
    pub fn image_path(&self, date: NaiveDate) -> PathBuf {
        self.images_dir.join(image_file_name(date))
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Carta existente, sin disparar generación
    pub async fn get_existing(&self, date: NaiveDate) -> Result<Option<CardRecord>, CardServiceError> {
        Ok(self.store.get(date).await?)
    }

    /// Todas las cartas guardadas
    pub async fn list_all(&self) -> Result<CardMap, CardServiceError> {
        Ok(self.store.read_all().await?)
    }

    /// Devolver la carta de la fecha, generándola si no existe
    pub async fn get_or_generate(&self, date: NaiveDate) -> Result<CardOutcome, CardServiceError> {
        if let Some(existing) = self.store.get(date).await? {
            return Ok(CardOutcome::Ready(existing));
        }

        // Comprobación e inserción síncronas, antes de cualquier await
        let Some(guard) = self.locks.try_acquire(date) else {
            info!("⏳ Carta {} ya en generación", date);
            return Ok(CardOutcome::Generating);
        };

        info!(
            "🚀 Iniciando generación para {} ({} en curso)...",
            guard.date(),
            self.locks.in_flight()
        );
        let started = std::time::Instant::now();

        let record = match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generate(date))
                .await
                .map_err(|_| {
                    warn!("⌛ Generación de {} superó {:?}, liberando lock", date, limit);
                    CardServiceError::TimedOut(date)
                })?,
            None => self.generate(date).await,
        }
        .map_err(|e| {
            error!("❌ Error generando carta {}: {}", date, e);
            e
        })?;

        info!(
            "✅ Carta {} generada en {}ms: {} ({}, holo={})",
            date,
            started.elapsed().as_millis(),
            record.car.display_name(),
            record.selected_color,
            record.is_holo
        );
        drop(guard);
        Ok(CardOutcome::Ready(record))
    }

    fn select(&self, history: &CardMap, date: NaiveDate) -> Selection {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        select_car_for_date(&self.catalog, history, date, &mut *rng)
    }

    /// Pipeline completo. Se ejecuta con el lock de la fecha tomado.
    async fn generate(&self, date: NaiveDate) -> Result<CardRecord, CardServiceError> {
        let history = self.store.read_all().await?;

        // Otra request pudo terminar entre nuestra lectura y la toma del lock
        if let Some(existing) = history.get(&date) {
            return Ok(existing.clone());
        }

        let Selection { car, color, is_holo } = self.select(&history, date);

        let prompt = CarPrompt {
            maker: car.maker.clone(),
            model: car.model.clone(),
            color: color.clone(),
            category: car.category,
            usage: car.usage,
        };
        let raw_image = self.generator.generate(&prompt).await?;

        let compositor = Arc::clone(&self.compositor);
        let (name, usage) = (car.display_name(), car.usage);
        let png = tokio::task::spawn_blocking(move || {
            compositor.composite_card(&raw_image, date, &name, usage, is_holo)
        })
        .await??;

        let image_path = self.image_path(date);
        self.write_image(&image_path, &png).await?;

        let record = CardRecord {
            car,
            date,
            selected_color: color,
            is_holo,
            image_path: image_path.to_string_lossy().into_owned(),
            created_at: Utc::now(),
        };
        self.store.upsert(record.clone()).await?;

        Ok(record)
    }

    /// Escritura vía temporal + rename: un lector nunca ve un PNG a medias
    async fn write_image(&self, path: &Path, png: &[u8]) -> Result<(), CardServiceError> {
        let to_error = |source| CardServiceError::ImageWrite {
            path: path.to_path_buf(),
            source,
        };
        let tmp_path = path.with_extension("png.tmp");
        tokio::fs::create_dir_all(&self.images_dir).await.map_err(to_error)?;
        tokio::fs::write(&tmp_path, png).await.map_err(to_error)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(to_error)?;
        Ok(())
    }
}

/// Nombre del fichero de imagen de una fecha
pub fn image_file_name(date: NaiveDate) -> String {
    format!("{}.png", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockImageGenerator;
    use crate::repositories::JsonFileCardStore;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> CardService {
        CardService::new(
            Arc::new(Catalog::builtin().unwrap()),
            Arc::new(JsonFileCardStore::new(dir.path().join("meta.json"))),
            Arc::new(MockImageGenerator::new()),
            Arc::new(CardCompositor::new(None)),
            dir.path().join("images"),
        )
        .with_rng_seed(3)
    }

    #[test]
    fn test_image_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(image_file_name(date), "2025-03-01.png");
    }

    #[tokio::test]
    async fn test_generation_writes_image_and_record() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let date: NaiveDate = "2025-03-10".parse().unwrap();

        let CardOutcome::Ready(record) = service.get_or_generate(date).await.unwrap() else {
            panic!("se esperaba una carta generada");
        };

        assert_eq!(record.date, date);
        assert!(record.car.allowed_colors.contains(&record.selected_color));
        assert_eq!(record.is_holo, record.car.is_high_value());
        assert_eq!(PathBuf::from(&record.image_path), service.image_path(date));

        let png = std::fs::read(&record.image_path).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (1024, 1792));

        assert_eq!(service.get_existing(date).await.unwrap(), Some(record));
        assert!(!service.locks().is_locked(date));
    }

    #[tokio::test]
    async fn test_get_existing_does_not_generate() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let date: NaiveDate = "2025-03-10".parse().unwrap();

        assert_eq!(service.get_existing(date).await.unwrap(), None);
        assert!(service.list_all().await.unwrap().is_empty());
        assert!(!service.image_path(date).exists());
    }
}

//! Store de cartas diarias
//!
//! Persistencia clave-valor fecha -> CardRecord sobre un único fichero JSON.
//! Cada acceso lee el fichero completo; cada upsert lo reescribe entero.
//!
//! El upsert NO es atómico entre llamadas concurrentes: dos escrituras
//! simultáneas (incluso para fechas distintas) pueden pisarse y la más lenta
//! gana. Con una escritura por día es aceptable.
//! La escritura del fichero en sí pasa por un temporal + rename, así que un
//! lector nunca ve un JSON a medias.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::card::{CardMap, CardRecord};

/// Errores del store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Operaciones del store de cartas
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Leer el mapa completo fecha -> carta
    async fn read_all(&self) -> Result<CardMap, StoreError>;

    /// Leer la carta de una fecha
    async fn get(&self, date: NaiveDate) -> Result<Option<CardRecord>, StoreError> {
        Ok(self.read_all().await?.remove(&date))
    }

    /// Insertar o sobrescribir la carta de su fecha.
    /// Read-modify-write del mapa completo, sin control de concurrencia.
    async fn upsert(&self, record: CardRecord) -> Result<(), StoreError>;
}

/// Store sobre meta.json
#[derive(Debug, Clone)]
pub struct JsonFileCardStore {
    path: PathBuf,
}

impl JsonFileCardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn write_all(&self, store: &CardMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(store)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

#[async_trait]
impl CardStore for JsonFileCardStore {
    async fn read_all(&self) -> Result<CardMap, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("📂 Store {} no existe todavía, mapa vacío", self.path.display());
                return Ok(CardMap::new());
            }
            Err(e) => {
                error!("❌ Error leyendo store {}: {}", self.path.display(), e);
                return Err(self.io_error(e));
            }
        };

        serde_json::from_str(&data).map_err(|source| {
            error!("❌ Store {} corrupto: {}", self.path.display(), source);
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }

    async fn upsert(&self, record: CardRecord) -> Result<(), StoreError> {
        let mut store = self.read_all().await?;
        let date = record.date;
        store.insert(date, record);
        self.write_all(&store).await?;

        debug!("💾 Carta {} guardada ({} cartas en total)", date, store.len());
        Ok(())
    }
}

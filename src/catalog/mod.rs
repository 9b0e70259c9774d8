//! Catálogo de coches
//!
//! El catálogo se valida al cargarse: nunca está vacío, los ids son únicos
//! y cada coche tiene al menos un color permitido. El selector depende de
//! estas garantías.

pub mod cars;

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use validator::Validate;

use crate::models::car::{Car, CarCategory};

/// Errores de carga del catálogo
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Duplicate car id: {0}")]
    DuplicateId(String),

    #[error("Invalid car '{id}': {source}")]
    InvalidCar {
        id: String,
        #[source]
        source: validator::ValidationErrors,
    },

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Catálogo validado de coches candidatos
#[derive(Debug, Clone)]
pub struct Catalog {
    cars: Vec<Car>,
}

impl Catalog {
    /// Crear un catálogo validando todas sus entradas
    pub fn new(cars: Vec<Car>) -> Result<Self, CatalogError> {
        if cars.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for car in &cars {
            car.validate().map_err(|source| CatalogError::InvalidCar {
                id: car.id.clone(),
                source,
            })?;
            if !seen.insert(car.id.as_str()) {
                return Err(CatalogError::DuplicateId(car.id.clone()));
            }
        }

        Ok(Self { cars })
    }

    /// Catálogo incorporado en el binario
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(cars::BUILTIN_CARS.clone())
    }

    /// Cargar un catálogo desde un array JSON de coches
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)?;
        let cars: Vec<Car> = serde_json::from_str(&data)?;
        Self::new(cars)
    }

    pub fn all(&self) -> &[Car] {
        &self.cars
    }

    pub fn by_category(&self, category: CarCategory) -> Vec<&Car> {
        self.cars.iter().filter(|c| c.category == category).collect()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}

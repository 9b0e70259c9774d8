//! Modelo de Car
//!
//! Este módulo contiene el struct Car del catálogo y sus enums asociados.
//! Los nombres serializados coinciden con el formato del fichero meta.json.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Precio (en yenes) a partir del cual una carta se considera holo
pub const HOLO_PRICE_THRESHOLD_YEN: u64 = 10_000_000;

/// Categoría del coche - determina el peso en la selección diaria
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CarCategory {
    JpPassenger,
    Special,
    Luxury,
}

impl CarCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarCategory::JpPassenger => "jp_passenger",
            CarCategory::Special => "special",
            CarCategory::Luxury => "luxury",
        }
    }
}

impl fmt::Display for CarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uso del vehículo - solo aplica a vehículos especiales y de carga
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CarUsage {
    Ambulance,
    FireEngine,
    Police,
    Bus,
    Truck,
    Mail,
    Carrier,
    Construction,
    Other,
}

impl CarUsage {
    /// Forma legible para prompts y overlays ("fire engine")
    pub fn display_name(&self) -> &'static str {
        match self {
            CarUsage::Ambulance => "ambulance",
            CarUsage::FireEngine => "fire engine",
            CarUsage::Police => "police",
            CarUsage::Bus => "bus",
            CarUsage::Truck => "truck",
            CarUsage::Mail => "mail",
            CarUsage::Carrier => "carrier",
            CarUsage::Construction => "construction",
            CarUsage::Other => "other",
        }
    }
}

impl fmt::Display for CarUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// País de origen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    Jp,
    Overseas,
}

/// Entrada inmutable del catálogo de coches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct Car {
    #[validate(length(min = 1))]
    pub id: String,

    #[validate(length(min = 1))]
    pub maker: String,

    #[validate(length(min = 1))]
    pub model: String,

    pub category: CarCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CarUsage>,

    pub price_yen_estimate: u64,

    pub country: Country,

    /// Colores en inglés, se usan tal cual en el prompt
    #[validate(length(min = 1))]
    pub allowed_colors: Vec<String>,
}

impl Car {
    /// Un coche es de alto valor (y por tanto holo) a partir de 10M de yenes
    pub fn is_high_value(&self) -> bool {
        self.price_yen_estimate >= HOLO_PRICE_THRESHOLD_YEN
    }

    /// Nombre visible: "<maker> <model>"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.maker, self.model)
    }
}
